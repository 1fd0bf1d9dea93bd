// Skywatch - cloud telemetry polling console
// Binary entry point

use anyhow::Result;
use clap::Parser;
use skywatch::{cli, observability};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    observability::init(cli.log_json)?;

    cli::commands::execute(cli).await
}
