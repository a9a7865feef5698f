//! hap - provision remote hosts by pushing git repositories over SSH

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use hap_cli::cli::Cli;
use hap_cli::output::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "hap_cli=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_errors = cli.json;
    if let Err(e) = cli.run().await {
        match json::format_error(&format!("{e:#}"), "HAP_FAILED") {
            Ok(body) if json_errors => eprintln!("{body}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
