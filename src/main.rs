//! cf-start - start platform applications and follow them until they run

use cf_start::cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic log filter.
const LOG_FILTER_ENV: &str = "CF_START_LOG";

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
