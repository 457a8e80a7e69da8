//! `cdk-docset`: build an offline, searchable docset of the AWS CDK API
//! reference.
//!
//! Mirrors the published reference site, rewrites every page for offline
//! viewing and indexes it for a documentation browser.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
