//! Breadth-first discovery of article URLs on one site.
//!
//! The crawl starts from the base URL plus a handful of likely section and
//! author-index paths, follows same-site index-like links in FIFO order, and
//! collects every same-site article-like link it sees until the cap is hit.
//!
//! # Link classes
//!
//! | Class | Rule | Effect |
//! |-------|------|--------|
//! | article-like | dated path (`/2024/05/06/`) or a content keyword | collected (query stripped) |
//! | index-like | author/staff/profile path, or at most 3 path segments | enqueued |
//!
//! A link can be both.

use crate::config::Config;
use crate::fetch::Fetch;
use crate::scrapers::robots::RobotsCache;
use crate::utils::{bare_host, path_segments};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};
use url::Url;

static DATED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d{4}/\d{1,2}/\d{1,2}/").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

const ARTICLE_KEYWORDS: &[&str] = &[
    "/article", "/news/", "/story", "/opinion", "/feature", "/analysis", "/reports", "/sport",
    "/sports",
];
const INDEX_KEYWORDS: &[&str] = &["/author", "/authors", "/staff", "/contributors", "/profile"];

/// How a same-site link should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkClass {
    pub article_like: bool,
    pub index_like: bool,
}

/// Classify a link by its path alone.
pub fn classify_link(url: &Url) -> LinkClass {
    let path = url.path().to_lowercase();
    LinkClass {
        article_like: DATED_PATH.is_match(&path)
            || ARTICLE_KEYWORDS.iter().any(|k| path.contains(k)),
        index_like: INDEX_KEYWORDS.iter().any(|k| path.contains(k))
            || path_segments(url).len() <= 3,
    }
}

/// Whether `url` belongs to the site rooted at `site`.
///
/// `www.` prefixes are ignored and subdomains count as the same site. When
/// `site` names an explicit port, `url` must use that port too.
pub fn same_site(site: &Url, url: &Url) -> bool {
    let (Some(site_host), Some(host)) = (site.host_str(), url.host_str()) else {
        return false;
    };
    if site.port().is_some() && url.port_or_known_default() != site.port_or_known_default() {
        return false;
    }
    let site_host = bare_host(site_host);
    let host = bare_host(host);
    host == site_host || host.ends_with(&format!(".{site_host}"))
}

/// Absolute URLs of every anchor on a page, fragments removed.
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    document
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| page_url.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

/// The crawl queue plus the set of URLs already seen.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    visited: usize,
}

impl Frontier {
    /// A frontier holding `base` followed by each seed path joined onto it.
    pub fn seeded(base: &Url, seed_paths: &[String]) -> Self {
        let mut frontier = Self::default();
        frontier.push(base.clone());
        for seed in seed_paths {
            match base.join(seed) {
                Ok(url) => {
                    frontier.push(url);
                }
                Err(e) => warn!(%seed, error = %e, "Skipping unusable seed path"),
            }
        }
        frontier
    }

    /// Enqueue a URL unless it was queued or visited before.
    pub fn push(&mut self, url: Url) -> bool {
        if self.seen.insert(url.as_str().to_string()) {
            self.queue.push_back(url);
            true
        } else {
            false
        }
    }

    /// Take the next URL to visit.
    pub fn next_url(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.visited += 1;
        Some(url)
    }

    /// URLs still waiting to be visited.
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited(&self) -> usize {
        self.visited
    }
}

/// Insertion-ordered set of article URLs, keyed with the query string removed.
#[derive(Debug, Default)]
struct ArticleSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ArticleSet {
    fn insert(&mut self, url: &Url) {
        let mut url = url.clone();
        url.set_query(None);
        url.set_fragment(None);
        let key = url.to_string();
        if self.seen.insert(key.clone()) {
            self.ordered.push(key);
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }
}

/// Crawl `base_url` and return up to `config.max_articles` article URLs.
///
/// Fetch failures, non-200 responses and robots.txt refusals only skip the
/// URL in question; the crawl always runs to the cap or an empty frontier.
#[instrument(level = "info", skip_all, fields(base = %base_url))]
pub async fn find_article_links<F: Fetch>(
    fetcher: &F,
    base_url: &Url,
    config: &Config,
    robots: &mut RobotsCache,
) -> Vec<String> {
    let cap = config.max_articles;
    if base_url.host_str().is_none() {
        warn!("Base URL has no host; nothing to crawl");
        return Vec::new();
    }

    let mut frontier = Frontier::seeded(base_url, &config.seed_paths);
    let mut articles = ArticleSet::default();

    while articles.len() < cap {
        let Some(url) = frontier.next_url() else {
            break;
        };
        if !robots.is_allowed(fetcher, &url).await {
            continue;
        }

        let page = match fetcher.get(url.as_str(), config.request_timeout()).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                debug!(%url, status = page.status, "Skipping non-200 page");
                continue;
            }
            Err(e) => {
                debug!(%url, error = %e, "Fetch failed; skipping");
                continue;
            }
        };

        let mut found = 0usize;
        for link in extract_links(&page.body, &page.url) {
            if !same_site(base_url, &link) {
                continue;
            }
            let class = classify_link(&link);
            if class.article_like {
                articles.insert(&link);
                found += 1;
            }
            if class.index_like {
                frontier.push(link);
            }
        }
        debug!(%url, found, total = articles.len(), queued = frontier.len(), "Crawled page");

        tokio::time::sleep(config.crawl_delay()).await;
    }

    let mut urls = articles.ordered;
    urls.truncate(cap);
    info!(
        count = urls.len(),
        pages_visited = frontier.visited(),
        "Collected article URLs"
    );
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;
    use crate::scrapers::robots::ROBOTS_AGENT;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn test_config(max_articles: usize) -> Config {
        Config {
            max_articles,
            crawl_delay_ms: 0,
            seed_paths: vec!["/authors".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn test_classify_link() {
        let dated = classify_link(&url("https://x.com/2024/5/6/some-story-slug/extra/more"));
        assert!(dated.article_like);
        assert!(!dated.index_like);

        let keyword = classify_link(&url("https://x.com/opinion/columns/why-it-matters"));
        assert!(keyword.article_like);
        assert!(keyword.index_like);

        let author = classify_link(&url("https://x.com/people/staff/a/b/c/jane-doe"));
        assert!(!author.article_like);
        assert!(author.index_like);

        let deep = classify_link(&url("https://x.com/a/b/c/d"));
        assert_eq!(deep, LinkClass::default());
    }

    #[test]
    fn test_same_site() {
        let site = url("https://example.com/");
        assert!(same_site(&site, &url("https://www.example.com/a")));
        assert!(same_site(&site, &url("https://sport.example.com/a")));
        assert!(same_site(&site, &url("https://example.com:8443/a")));
        assert!(!same_site(&site, &url("https://notexample.com/a")));
        assert!(!same_site(&site, &url("https://example.com.evil.io/a")));
    }

    #[test]
    fn test_same_site_honours_explicit_port() {
        let site = url("http://127.0.0.1:4100/");
        assert!(same_site(&site, &url("http://127.0.0.1:4100/news/a")));
        assert!(!same_site(&site, &url("http://127.0.0.1:4200/news/a")));
        assert!(!same_site(&site, &url("http://127.0.0.1/news/a")));
    }

    #[test]
    fn test_extract_links_resolves_and_filters() {
        let html = r##"
            <a href="/news/a">rel</a>
            <a href="https://other.com/x#frag">abs</a>
            <a href="#top">anchor</a>
            <a href="mailto:desk@example.com">mail</a>
            <a href="  story/b?id=3#c ">spaced</a>
        "##;
        let links = extract_links(html, &url("https://example.com/section/"));
        let links: Vec<String> = links.into_iter().map(String::from).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/news/a",
                "https://other.com/x",
                "https://example.com/section/story/b?id=3",
            ]
        );
    }

    #[test]
    fn test_frontier_deduplicates() {
        let base = url("https://example.com/");
        let mut frontier =
            Frontier::seeded(&base, &["".to_string(), "/news".to_string(), "/news".to_string()]);
        assert_eq!(frontier.len(), 2);
        assert!(!frontier.push(url("https://example.com/news")));
        assert_eq!(frontier.next_url().unwrap().as_str(), "https://example.com/");
        assert_eq!(frontier.next_url().unwrap().as_str(), "https://example.com/news");
        assert!(frontier.next_url().is_none());
        assert!(!frontier.push(url("https://example.com/")));
        assert_eq!(frontier.visited(), 2);
    }

    #[tokio::test]
    async fn test_crawl_collects_same_site_articles() {
        let home = r#"
            <a href="/2024/01/02/budget-vote/">dated</a>
            <a href="/news/local/fire?utm=1">news</a>
            <a href="/news/local/fire?utm=2">news dup</a>
            <a href="https://elsewhere.com/story/x">offsite</a>
            <a href="/authors/jane">author page</a>
        "#;
        let jane = r#"<a href="/story/jane-latest">latest</a>"#;
        let fetcher = MemoryFetcher::new()
            .page("https://example.com/", home)
            .page("https://example.com/authors/jane", jane);
        let mut robots = RobotsCache::new(ROBOTS_AGENT, Duration::from_secs(1));

        let urls = find_article_links(
            &fetcher,
            &url("https://example.com"),
            &test_config(800),
            &mut robots,
        )
        .await;

        assert_eq!(
            urls,
            vec![
                "https://example.com/2024/01/02/budget-vote/",
                "https://example.com/news/local/fire",
                "https://example.com/story/jane-latest",
            ]
        );
        assert!(!fetcher.requested().iter().any(|u| u.contains("elsewhere.com")));
    }

    #[tokio::test]
    async fn test_crawl_respects_cap_and_failures() {
        let home = r#"
            <a href="/broken">broken index</a>
            <a href="/down">down index</a>
            <a href="/hub">hub</a>
        "#;
        let hub = r#"
            <a href="/story/1">1</a>
            <a href="/story/2">2</a>
            <a href="/story/3">3</a>
        "#;
        let fetcher = MemoryFetcher::new()
            .page("https://example.com/", home)
            .status("https://example.com/broken", 500)
            .unreachable("https://example.com/down")
            .page("https://example.com/hub", hub);
        let mut robots = RobotsCache::new(ROBOTS_AGENT, Duration::from_secs(1));

        let urls =
            find_article_links(&fetcher, &url("https://example.com/"), &test_config(2), &mut robots)
                .await;
        assert_eq!(
            urls,
            vec!["https://example.com/story/1", "https://example.com/story/2"]
        );
        assert_eq!(fetcher.request_count("https://example.com/down"), 1);
        assert_eq!(fetcher.request_count("https://example.com/story/1"), 0);
    }

    #[tokio::test]
    async fn test_crawl_skips_disallowed_pages() {
        let home = r#"<a href="/private/index">hidden</a><a href="/story/ok">ok</a>"#;
        let hidden = r#"<a href="/story/secret">secret</a>"#;
        let fetcher = MemoryFetcher::new()
            .page("https://example.com/robots.txt", "User-agent: *\nDisallow: /private\n")
            .page("https://example.com/", home)
            .page("https://example.com/private/index", hidden);
        let mut robots = RobotsCache::new(ROBOTS_AGENT, Duration::from_secs(1));

        let urls =
            find_article_links(&fetcher, &url("https://example.com/"), &test_config(10), &mut robots)
                .await;
        assert_eq!(urls, vec!["https://example.com/story/ok"]);
        assert_eq!(fetcher.request_count("https://example.com/private/index"), 0);
        assert_eq!(fetcher.request_count("https://example.com/robots.txt"), 1);
    }
}
