//! HTTP access behind a small trait.
//!
//! Every network touch in the pipeline (detection probes, search pages,
//! robots.txt, crawl pages, article pages) goes through [`Fetch`], so the
//! whole pipeline can run against an in-memory site in tests.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, one GET with a caller-chosen timeout
//! - [`HttpFetcher`]: the production implementation over a shared
//!   `reqwest::Client`
//!
//! Requests are never retried here. A failed or non-200 fetch is reported to
//! the caller, which decides to skip the item.

use crate::error::Result;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after redirects.
    pub url: Url,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching a single URL.
///
/// Implementors return `Ok` for any response that arrived (including 4xx and
/// 5xx) and `Err` for transport failures such as DNS errors, refused
/// connections and timeouts.
pub trait Fetch {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage>;
}

/// Production fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher that sends `user_agent` with every request.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage> {
        let t0 = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(FetchedPage {
            status,
            url: final_url,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_http_fetcher_reports_status_and_body() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/ok")
            .match_header("user-agent", "TestAgent/1.0")
            .with_status(200)
            .with_body("<html>hi</html>")
            .expect(1)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new("TestAgent/1.0").unwrap();
        let page = fetcher
            .get(&format!("{}/ok", server.url()), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(page.is_ok());
        assert_eq!(page.body, "<html>hi</html>");

        let page = fetcher
            .get(&format!("{}/missing", server.url()), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!page.is_ok());
        assert_eq!(page.status, 404);

        ok.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetcher_transport_error() {
        let fetcher = HttpFetcher::new("TestAgent/1.0").unwrap();
        // Port 9 on localhost is the discard service and is essentially never listening.
        let result = fetcher
            .get("http://127.0.0.1:9/", Duration::from_secs(2))
            .await;
        assert!(result.is_err());
    }
}
