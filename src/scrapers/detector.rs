//! Outlet name to website resolution.
//!
//! Detection runs in two phases:
//!
//! 1. **Probing**: guess domains from the outlet name (`"The Hindu"` gives
//!    `thehindu` and `the-hindu`) crossed with the configured TLDs, and take
//!    the first one that answers HTTP 200.
//! 2. **Search**: ask each configured search endpoint for
//!    `"<outlet> official website"` and take the first usable result link,
//!    unwrapping DuckDuckGo-style `uddg=` redirects.
//!
//! Every failure is local to the candidate or endpoint that caused it.

use crate::config::{Config, QUERY_PLACEHOLDER};
use crate::fetch::Fetch;
use crate::utils::{bare_host, origin_of};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static UDDG_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"uddg=([^&]+)").unwrap());

/// Hosts whose links are never taken as an outlet's site.
const SEARCH_ENGINE_HOSTS: &[&str] = &["duckduckgo.com", "bing.com", "google.com"];

/// Candidate base URLs for an outlet name, in probe order.
///
/// Only ASCII letters, digits and spaces survive tokenization, so a name made
/// entirely of punctuation yields no candidates.
pub fn candidate_domains(outlet: &str, tlds: &[String]) -> Vec<String> {
    let cleaned: String = outlet
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let bases = [tokens.concat(), tokens.join("-")]
        .into_iter()
        .unique()
        .collect::<Vec<_>>();
    bases
        .iter()
        .cartesian_product(tlds)
        .flat_map(|(base, tld)| [format!("https://www.{base}{tld}"), format!("https://{base}{tld}")])
        .collect()
}

/// Fill a search endpoint template with the encoded `"<outlet> official website"` query.
pub fn search_url(template: &str, outlet: &str) -> String {
    let query = format!("{} official website", outlet.trim());
    template.replace(QUERY_PLACEHOLDER, &urlencoding::encode(&query))
}

/// Pick the outlet's site from a search results page.
///
/// Returns the `scheme://host` of the first acceptable link in document
/// order. `page_url` resolves relative hrefs and is itself never accepted.
pub fn pick_search_result(html: &str, page_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let own_origin = origin_of(page_url);

    for anchor in document.select(&ANCHORS) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };

        if href.contains("uddg=") || href.contains("/l/?") {
            if let Some(origin) = unwrap_redirect(href, page_url) {
                return Some(origin);
            }
        }

        if !href.to_ascii_lowercase().starts_with("http") {
            continue;
        }
        let Ok(link) = Url::parse(href) else {
            continue;
        };
        if !matches!(link.scheme(), "http" | "https") {
            continue;
        }
        let Some(host) = link.host_str() else {
            continue;
        };
        let origin = origin_of(&link);
        if is_search_engine(host) || origin == own_origin {
            continue;
        }
        if origin.is_some() {
            return origin;
        }
    }
    None
}

/// Decode the target of a search-engine redirect link.
fn unwrap_redirect(href: &str, page_url: &Url) -> Option<String> {
    let target = page_url
        .join(href)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .or_else(|| {
            UDDG_PARAM
                .captures(href)
                .and_then(|c| urlencoding::decode(&c[1]).ok().map(|d| d.into_owned()))
        })?;

    let target = Url::parse(&target).ok()?;
    if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
        return None;
    }
    origin_of(&target)
}

fn is_search_engine(host: &str) -> bool {
    let host = bare_host(host);
    SEARCH_ENGINE_HOSTS
        .iter()
        .any(|engine| host == *engine || host.ends_with(&format!(".{engine}")))
}

/// Resolve an outlet name to its website's `scheme://host`.
///
/// Returns `None` when neither probing nor search finds anything.
#[instrument(level = "info", skip_all, fields(%outlet))]
pub async fn detect_website<F: Fetch>(fetcher: &F, outlet: &str, config: &Config) -> Option<String> {
    if outlet.trim().is_empty() {
        warn!("Empty outlet name; nothing to detect");
        return None;
    }

    let candidates = candidate_domains(outlet, &config.tlds);
    debug!(count = candidates.len(), "Probing candidate domains");
    for candidate in &candidates {
        match fetcher.get(candidate, config.probe_timeout()).await {
            Ok(page) if page.is_ok() => {
                if let Some(origin) = Url::parse(candidate).ok().as_ref().and_then(origin_of) {
                    info!(website = %origin, "Detected website by probing");
                    return Some(origin);
                }
            }
            Ok(page) => debug!(%candidate, status = page.status, "Probe rejected"),
            Err(e) => debug!(%candidate, error = %e, "Probe failed"),
        }
    }

    for template in &config.search_endpoints {
        let url = search_url(template, outlet);
        let page = match fetcher.get(&url, config.search_timeout()).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                debug!(%url, status = page.status, "Search endpoint rejected query");
                continue;
            }
            Err(e) => {
                debug!(%url, error = %e, "Search endpoint failed");
                continue;
            }
        };
        let Ok(page_url) = Url::parse(&url) else {
            continue;
        };
        if let Some(origin) = pick_search_result(&page.body, &page_url) {
            info!(website = %origin, endpoint = %template, "Detected website via search");
            return Some(origin);
        }
    }

    warn!("Could not detect a website");
    None
}
