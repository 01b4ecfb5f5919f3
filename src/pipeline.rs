//! One end-to-end run: outlet name in, snapshot file out.
//!
//! # Stages
//!
//! 1. Write a placeholder snapshot so readers always find valid JSON
//! 2. Detect the outlet's website
//! 3. Crawl it for article URLs
//! 4. Fetch and extract each article, folding bylines into a [`ProfileBook`]
//!    and checkpointing every `checkpoint_every` processed pages
//! 5. Write the final snapshot
//!
//! Everything runs sequentially on the caller's task. Stage failures are
//! absorbed: an undetectable outlet still ends with a (profile-less) final
//! snapshot.

use crate::config::Config;
use crate::fetch::Fetch;
use crate::models::{AuthorProfile, Snapshot};
use crate::outputs::checkpoint::Checkpointer;
use crate::profiles::ProfileBook;
use crate::scrapers::crawler::find_article_links;
use crate::scrapers::detector::detect_website;
use crate::scrapers::extractor::extract_metadata;
use crate::scrapers::robots::{RobotsCache, ROBOTS_AGENT};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Drives a run against any [`Fetch`] implementation.
#[derive(Debug)]
pub struct Pipeline<F> {
    config: Config,
    fetcher: F,
    checkpointer: Checkpointer,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        let checkpointer = Checkpointer::new(config.output.clone());
        Self {
            config,
            fetcher,
            checkpointer,
        }
    }

    /// Profile `outlet` and return the final snapshot, which has also been
    /// written to the configured output path.
    #[instrument(level = "info", skip_all, fields(%outlet))]
    pub async fn run(&self, outlet: &str) -> Snapshot {
        let t0 = Instant::now();
        let outlet = outlet.trim();
        self.checkpointer.write(&Snapshot::placeholder(outlet));

        let (website, profiles) = match detect_website(&self.fetcher, outlet, &self.config).await {
            Some(website) => {
                let profiles = self.profile_website(outlet, &website).await;
                (website, profiles)
            }
            None => {
                warn!("No website detected; final snapshot will be empty");
                (String::new(), Vec::new())
            }
        };

        let snapshot = Snapshot::complete(outlet, &website, profiles);
        self.checkpointer.write(&snapshot);
        info!(
            %website,
            profiles = snapshot.profiles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            output = %self.checkpointer.path().display(),
            "Run complete"
        );
        snapshot
    }

    /// Crawl `website` and aggregate author profiles from its articles.
    #[instrument(level = "info", skip_all, fields(%website))]
    pub async fn profile_website(&self, outlet: &str, website: &str) -> Vec<AuthorProfile> {
        let base = match Url::parse(website) {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "Detected website is not a valid URL");
                return Vec::new();
            }
        };

        let mut robots = RobotsCache::new(ROBOTS_AGENT, self.config.request_timeout());
        let urls = find_article_links(&self.fetcher, &base, &self.config, &mut robots).await;
        info!(count = urls.len(), "Collected article URLs");

        let mut book = ProfileBook::new();
        let mut processed = 0usize;
        for url in &urls {
            if let Some(limit) = self.config.profile_limit {
                if book.named_len() >= limit {
                    info!(limit, "Profile limit reached; stopping early");
                    break;
                }
            }

            let Ok(parsed) = Url::parse(url) else {
                continue;
            };
            if !robots.is_allowed(&self.fetcher, &parsed).await {
                continue;
            }
            let page = match self.fetcher.get(url, self.config.request_timeout()).await {
                Ok(page) if page.is_ok() => page,
                Ok(page) => {
                    debug!(%url, status = page.status, "Skipping article");
                    continue;
                }
                Err(e) => {
                    debug!(%url, error = %e, "Article fetch failed");
                    continue;
                }
            };

            let metadata = extract_metadata(&page.body, &parsed);
            debug!(
                %url,
                title_source = metadata.title.provenance(),
                authors_source = metadata.authors.provenance(),
                section_source = metadata.section.provenance(),
                date_source = metadata.published.provenance(),
                "Extracted article"
            );
            for author in metadata.authors() {
                book.observe(author, &metadata, url);
            }

            processed += 1;
            if self.config.checkpoint_every > 0 && processed % self.config.checkpoint_every == 0 {
                let snapshot = Snapshot::in_progress(
                    outlet,
                    website,
                    book.finalize(self.config.profile_limit),
                    processed,
                );
                self.checkpointer.write(&snapshot);
                info!(processed, authors = book.named_len(), "Progress checkpoint");
            }
        }

        info!(processed, authors = book.named_len(), "Finished processing articles");
        book.finalize(self.config.profile_limit)
    }
}
