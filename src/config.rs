//! Run configuration.
//!
//! Every component receives the pieces of [`Config`] it needs at construction
//! time; nothing reads process-wide state. Values come from built-in defaults,
//! optionally overridden by a YAML file and then by command-line flags (see
//! [`crate::cli::Cli::config`]).
//!
//! ```yaml
//! output: /srv/newstrace/data.json
//! max_articles: 400
//! checkpoint_every: 10
//! profile_limit: 50
//! crawl_delay_ms: 500
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Placeholder substituted with the URL-encoded search query in
/// [`Config::search_endpoints`].
pub const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Destination of the JSON snapshot.
    pub output: PathBuf,
    /// Cap on article URLs collected by the crawler.
    pub max_articles: usize,
    /// Write a progress snapshot every this many processed pages.
    pub checkpoint_every: usize,
    /// Upper bound on the finalized profile list. `None` keeps every profile.
    /// Page processing also stops once this many distinct authors are known.
    pub profile_limit: Option<usize>,
    pub user_agent: String,
    /// Timeout for crawl and article fetches.
    pub request_timeout_secs: u64,
    /// Timeout for each candidate-domain probe during detection.
    pub probe_timeout_secs: u64,
    /// Timeout for search-engine fallback requests.
    pub search_timeout_secs: u64,
    /// Politeness delay between crawl fetches.
    pub crawl_delay_ms: u64,
    /// Top-level domains tried when guessing an outlet's domain.
    pub tlds: Vec<String>,
    /// Search result page templates containing [`QUERY_PLACEHOLDER`].
    pub search_endpoints: Vec<String>,
    /// Paths joined onto the base URL to seed the crawl frontier.
    pub seed_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("data.json"),
            max_articles: 800,
            checkpoint_every: 5,
            profile_limit: Some(30),
            user_agent: "Mozilla/5.0 (NewsTraceBot/1.0)".to_string(),
            request_timeout_secs: 8,
            probe_timeout_secs: 5,
            search_timeout_secs: 6,
            crawl_delay_ms: 200,
            tlds: [".com", ".co.uk", ".org", ".in", ".net", ".news", ".co"]
                .into_iter()
                .map(String::from)
                .collect(),
            search_endpoints: vec![
                format!("https://duckduckgo.com/html/?q={QUERY_PLACEHOLDER}"),
                format!("https://www.bing.com/search?q={QUERY_PLACEHOLDER}"),
            ],
            seed_paths: [
                "", "/news", "/latest", "/world", "/articles", "/section", "/topics", "/author",
                "/authors", "/contributors", "/staff",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Config {
    /// Load a YAML config file; fields missing from the file keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }
}
