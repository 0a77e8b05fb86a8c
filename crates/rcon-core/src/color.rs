//! Legacy `§` color codes in server output
//!
//! A code is the sentinel followed by one of `0-9`, `a-f` (colors) or `r`
//! (reset).

/// Marker that introduces a color code
pub const SENTINEL: char = '§';

/// ANSI sequence that restores the default style
pub const ANSI_RESET: &str = "\x1b[0m";

fn ansi(code: char) -> Option<&'static str> {
    let escape = match code {
        '0' => "\x1b[30m", // black
        '1' => "\x1b[34m", // dark blue
        '2' => "\x1b[32m", // dark green
        '3' => "\x1b[36m", // dark aqua
        '4' => "\x1b[31m", // dark red
        '5' => "\x1b[35m", // dark purple
        '6' => "\x1b[33m", // gold
        '7' => "\x1b[37m", // gray
        '8' => "\x1b[90m", // dark gray
        '9' => "\x1b[94m", // blue
        'a' => "\x1b[92m", // green
        'b' => "\x1b[96m", // aqua
        'c' => "\x1b[91m", // red
        'd' => "\x1b[95m", // light purple
        'e' => "\x1b[93m", // yellow
        'f' => "\x1b[97m", // white
        'r' => ANSI_RESET,
        _ => return None,
    };
    Some(escape)
}

/// Strip color codes or turn them into ANSI escapes
///
/// With `strip` every sentinel is removed, together with the code character
/// after it when that character is a known code; an unknown character after
/// a sentinel stays as plain text. Without `strip` known codes become ANSI
/// escapes, anything else passes through, and a reset is always appended.
#[must_use]
pub fn normalize(text: &str, strip: bool) -> String {
    let mut out = String::with_capacity(text.len() + ANSI_RESET.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != SENTINEL {
            out.push(c);
            continue;
        }

        let escape = chars.peek().copied().and_then(ansi);

        match (strip, escape) {
            (true, Some(_)) => {
                chars.next();
            }
            (true, None) => {}
            (false, Some(escape)) => {
                chars.next();
                out.push_str(escape);
            }
            (false, None) => out.push(c),
        }
    }

    if !strip {
        out.push_str(ANSI_RESET);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("", true), "");
        assert_eq!(normalize("", false), ANSI_RESET);
    }

    #[test]
    fn test_strip_known_codes() {
        assert_eq!(normalize("§aHello §cworld§r!", true), "Hello world!");
    }

    #[test]
    fn test_strip_unknown_code_keeps_character() {
        assert_eq!(normalize("§zHello", true), "zHello");
        assert_eq!(normalize("§§aHi", true), "Hi");
    }

    #[test]
    fn test_strip_never_leaves_sentinel() {
        for input in ["§", "a§", "§§", "§§§", "x§y§", "§A§r§"] {
            let out = normalize(input, true);
            assert!(!out.contains(SENTINEL), "{input:?} -> {out:?}");
        }
    }

    #[test]
    fn test_strip_is_idempotent() {
        for input in ["§aA§zB§", "plain", "§6gold§r and §§9blue"] {
            let once = normalize(input, true);
            assert_eq!(normalize(&once, true), once);
        }
    }

    #[test]
    fn test_ansi_replacement() {
        assert_eq!(
            normalize("§aok§r", false),
            format!("\x1b[92mok{ANSI_RESET}{ANSI_RESET}")
        );
    }

    #[test]
    fn test_ansi_unknown_code_is_literal() {
        assert_eq!(normalize("§zx", false), format!("§zx{ANSI_RESET}"));
    }

    #[test]
    fn test_trailing_sentinel() {
        assert_eq!(normalize("end§", false), format!("end§{ANSI_RESET}"));
        assert_eq!(normalize("end§", true), "end");
    }

    #[test]
    fn test_ansi_always_ends_with_reset() {
        for input in ["§4red", "no codes", "§", "§f§"] {
            assert!(normalize(input, false).ends_with(ANSI_RESET));
        }
    }
}
