use anyhow::Context;
use clap::Parser;
use teams_notifier_cli::{initialize_logging, run, Cli};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli).context("failed to initialize logging")?;

    if let Err(e) = run(cli).await {
        error!(error = %e, "CLI error");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}
