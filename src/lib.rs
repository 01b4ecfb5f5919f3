//! # NewsTrace
//!
//! Builds journalist profiles for a news outlet from nothing but its name.
//!
//! ## Features
//!
//! - Resolves an outlet name to its website by probing likely domains, with a
//!   search-engine fallback
//! - Crawls the site breadth-first for article URLs, honouring robots.txt
//! - Extracts title, bylines, section and publication date from each article,
//!   recording which page signal produced every field
//! - Aggregates bylines into per-author profiles with a dominant beat and the
//!   most recent article
//! - Checkpoints the profile list to a JSON file with atomic replacement, so
//!   readers never see a partial file
//!
//! ## Architecture
//!
//! 1. **Detection**: [`scrapers::detector`]
//! 2. **Crawling**: [`scrapers::crawler`] with [`scrapers::robots`]
//! 3. **Extraction**: [`scrapers::extractor`]
//! 4. **Aggregation**: [`profiles`]
//! 5. **Output**: [`outputs::checkpoint`]
//!
//! [`pipeline::Pipeline`] runs the stages in order over any
//! [`fetch::Fetch`] implementation.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod profiles;
pub mod scrapers;
pub mod utils;

pub use config::Config;
pub use error::{NewsTraceError, Result};
pub use models::{AuthorProfile, Snapshot};
pub use pipeline::Pipeline;
