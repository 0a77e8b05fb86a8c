//! Append-only command/response log

use std::path::Path;

use chrono::Local;
use tokio::io::AsyncWriteExt;

use crate::error::LogError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append one command and its response to the log at `path`
///
/// Parent directories and the file are created on first use. Does nothing
/// when `path` is `None`.
///
/// # Errors
/// Returns `LogError` if the directory or the file cannot be written.
pub async fn write(
    path: Option<&Path>,
    address: &str,
    command: &str,
    response: &str,
) -> Result<(), LogError> {
    let Some(path) = path else {
        return Ok(());
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| LogError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let entry = format_entry(&timestamp, address, command, response);

    let write_err = |source: std::io::Error| LogError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(write_err)?;

    file.write_all(entry.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    Ok(())
}

fn format_entry(timestamp: &str, address: &str, command: &str, response: &str) -> String {
    format!("[{timestamp}] {address}: {command}\n{response}\n\n")
}
