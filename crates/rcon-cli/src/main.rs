//! rcon CLI
//!
//! Executes commands on remote game servers over RCON, WebRCON or telnet

mod cli;

use clap::Parser;
use color_eyre::Result;
use rcon_core::{CliError, Executor};
use rcon_transport::NetworkConnector;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli).await?;

    Ok(())
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let mut session = cli.session()?;
    let mut stdout = tokio::io::stdout();

    if session.variables {
        let text = format!(
            "Got Print Variables param.\n{}\nPrint other variables:\n\
             Path to config file (if used): {}\n\
             Config environment: {}\n",
            session.describe(),
            cli.config_path(),
            cli.env,
        );
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let mut executor = Executor::new(NetworkConnector::new());

    let result = if cli.commands.is_empty() {
        let mut stdin = BufReader::new(tokio::io::stdin());
        executor
            .interactive(&mut stdin, &mut stdout, &mut session)
            .await
    } else {
        match session.validate_for_batch() {
            Ok(()) => {
                executor
                    .execute_all(&mut stdout, &session, &cli.commands)
                    .await
            }
            Err(e) => Err(e),
        }
    };

    if let Err(e) = executor.close().await {
        warn!(error = %e, "failed to close connection");
    }

    result
}
