//! Vellum CLI binary.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vellum::cli::{args::VellumArgs, commands::execute_command};

fn main() -> anyhow::Result<()> {
    let args = VellumArgs::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    execute_command(args).context("vellum command failed")?;
    Ok(())
}
