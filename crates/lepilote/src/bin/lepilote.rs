//! lepilote binary entry point

use clap::Parser;
use lepilote::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Cli::parse().run().await
}
