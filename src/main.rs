//! `newstrace` binary: profile one outlet and write the snapshot file.
//!
//! ## Usage
//!
//! ```sh
//! newstrace "The Hindu" -o ./data.json
//! ```
//!
//! Exit status is 0 on success, 2 for usage errors (including a missing
//! outlet name) and 1 for any other failure.

use clap::Parser;
use newstrace::cli::Cli;
use newstrace::fetch::HttpFetcher;
use newstrace::{Pipeline, Result};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    // Exits with status 2 on usage errors.
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "newstrace failed");
            ExitCode::from(1)
        }
    }
}

async fn run(args: &Cli) -> Result<()> {
    let config = args.config()?;
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    info!(outlet = %args.outlet, output = %config.output.display(), "newstrace starting up");

    let pipeline = Pipeline::new(config, fetcher);
    let snapshot = pipeline.run(&args.outlet).await;

    info!(
        website = %snapshot.website,
        profiles = snapshot.profiles.len(),
        "Snapshot written"
    );
    Ok(())
}
