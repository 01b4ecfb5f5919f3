//! Command-line interface definitions for NewsTrace.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The outlet name is the only required input; everything else tunes the run
//! and can also be set through a YAML config file or environment variables.

use crate::config::Config;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the NewsTrace scraper.
///
/// A missing outlet is a usage error: clap prints the usage text and exits
/// with status 2, distinct from the status 1 used for run-time failures.
///
/// # Examples
///
/// ```sh
/// # Basic usage
/// newstrace "The Hindu"
///
/// # Write the snapshot elsewhere and crawl less
/// newstrace "The Guardian" -o /tmp/guardian.json --max-articles 200
///
/// # Load tuning knobs from a file
/// newstrace "Reuters" -c ./newstrace.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Name of the news outlet to profile
    pub outlet: String,

    /// Path of the JSON snapshot to write
    #[arg(short, long, env = "NEWSTRACE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWSTRACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of article URLs to collect while crawling
    #[arg(long)]
    pub max_articles: Option<usize>,

    /// Write a progress snapshot every N processed pages
    #[arg(long)]
    pub checkpoint_every: Option<usize>,

    /// Maximum number of profiles kept in the final snapshot
    #[arg(long)]
    pub profile_limit: Option<usize>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl Cli {
    /// Build the run configuration: defaults, then the config file, then flags.
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(max_articles) = self.max_articles {
            config.max_articles = max_articles;
        }
        if let Some(every) = self.checkpoint_every {
            config.checkpoint_every = every;
        }
        if let Some(limit) = self.profile_limit {
            config.profile_limit = Some(limit);
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["newstrace", "The Hindu"]);

        assert_eq!(cli.outlet, "The Hindu");
        assert!(cli.output.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "newstrace",
            "Reuters",
            "-o",
            "/tmp/out.json",
            "--max-articles",
            "25",
            "--profile-limit",
            "5",
        ]);

        let config = cli.config().unwrap();
        assert_eq!(config.output, PathBuf::from("/tmp/out.json"));
        assert_eq!(config.max_articles, 25);
        assert_eq!(config.profile_limit, Some(5));
        assert_eq!(config.checkpoint_every, 5);
    }

    #[test]
    fn test_missing_outlet_is_usage_error() {
        let err = Cli::try_parse_from(["newstrace"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }
}
