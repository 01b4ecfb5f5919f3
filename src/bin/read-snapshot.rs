//! Print the profile list stored in a snapshot file as JSON.
//!
//! Accepts both the snapshot object and a bare profile array. A missing or
//! malformed file is reported and exits with status 1.

use clap::Parser;
use newstrace::outputs::checkpoint::read_profiles;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(about = "Print the profiles from a newstrace snapshot")]
struct Args {
    /// Snapshot file to read
    #[arg(env = "NEWSTRACE_OUTPUT", default_value = "data.json")]
    path: PathBuf,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let profiles = match read_profiles(&args.path) {
        Ok(profiles) => profiles,
        Err(e) => {
            error!(path = %args.path.display(), error = %e, "Could not read snapshot");
            return ExitCode::from(1);
        }
    };
    match serde_json::to_string_pretty(&profiles) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Could not encode profiles");
            ExitCode::from(1)
        }
    }
}
