use anyhow::Context;
use clap::Parser;
use meteo_processor::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await.context("meteo-processor run failed")
}
