//! robots.txt checks with a per-domain cache.
//!
//! Each `scheme://host` has its robots.txt fetched at most once per run.
//! The check fails open: a robots.txt that cannot be fetched, returns an
//! unexpected status or contains lines we do not understand never blocks a
//! URL. The one exception is an explicit 401/403 on robots.txt itself, which
//! is read as "the site does not want crawlers here".

use crate::fetch::Fetch;
use crate::utils::origin_of;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Product token matched against `User-agent` lines.
pub const ROBOTS_AGENT: &str = "NewsTraceBot";

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    /// Length of the raw pattern; longer patterns win.
    specificity: usize,
    pattern: Regex,
}

/// The rules from one robots.txt that apply to our agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    rules: Vec<Rule>,
    deny_all: bool,
}

impl RobotsRules {
    /// Rules that allow everything (missing or unreadable robots.txt).
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Rules that deny everything.
    pub fn deny_all() -> Self {
        Self {
            rules: Vec::new(),
            deny_all: true,
        }
    }

    /// Parse robots.txt content for `agent`.
    ///
    /// Groups naming the agent win over `*` groups. Unknown directives and
    /// malformed lines are ignored.
    pub fn parse(content: &str, agent: &str) -> Self {
        let agent = agent.to_lowercase();
        let mut groups: Vec<(Vec<String>, Vec<(bool, String)>)> = Vec::new();
        let mut last_was_agent = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if !last_was_agent || groups.is_empty() {
                        groups.push((Vec::new(), Vec::new()));
                    }
                    if let Some(group) = groups.last_mut() {
                        group.0.push(value.to_lowercase());
                    }
                    last_was_agent = true;
                }
                "allow" | "disallow" => {
                    last_was_agent = false;
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.1.push((directive == "allow", value.to_string()));
                    }
                }
                _ => last_was_agent = false,
            }
        }

        let applies_to_us = |agents: &Vec<String>| {
            agents
                .iter()
                .any(|a| a != "*" && !a.is_empty() && agent.contains(a.as_str()))
        };
        let specific: Vec<_> = groups.iter().filter(|(a, _)| applies_to_us(a)).collect();
        let chosen = if specific.is_empty() {
            groups
                .iter()
                .filter(|(a, _)| a.iter().any(|a| a == "*"))
                .collect()
        } else {
            specific
        };

        let rules = chosen
            .into_iter()
            .flat_map(|(_, rules)| rules.iter())
            .filter_map(|(allow, raw)| {
                compile_pattern(raw).map(|pattern| Rule {
                    allow: *allow,
                    specificity: raw.len(),
                    pattern,
                })
            })
            .collect();

        Self {
            rules,
            deny_all: false,
        }
    }

    /// Whether `path` (path plus optional `?query`) may be fetched.
    ///
    /// The longest matching rule decides; on a tie `Allow` wins.
    pub fn is_allowed(&self, path: &str) -> bool {
        if self.deny_all {
            return false;
        }
        let mut best: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|r| r.pattern.is_match(path)) {
            best = match best {
                Some(b) if b.specificity > rule.specificity => Some(b),
                Some(b) if b.specificity == rule.specificity && b.allow => Some(b),
                _ => Some(rule),
            };
        }
        best.is_none_or(|rule| rule.allow)
    }
}

/// Turn a robots path pattern (`*` wildcard, trailing `$` anchor) into a regex.
fn compile_pattern(raw: &str) -> Option<Regex> {
    let (body, anchored) = match raw.strip_suffix('$') {
        Some(body) => (body, true),
        None => (raw, false),
    };
    let mut pattern = String::from("^");
    pattern.push_str(
        &body
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*"),
    );
    if anchored {
        pattern.push('$');
    }
    Regex::new(&pattern).ok()
}

/// robots.txt rules cached by origin for the duration of one run.
#[derive(Debug)]
pub struct RobotsCache {
    agent: String,
    timeout: Duration,
    by_origin: HashMap<String, RobotsRules>,
}

impl RobotsCache {
    pub fn new(agent: &str, timeout: Duration) -> Self {
        Self {
            agent: agent.to_string(),
            timeout,
            by_origin: HashMap::new(),
        }
    }

    /// Check `url` against its domain's robots.txt, fetching it on first use.
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    pub async fn is_allowed<F: Fetch>(&mut self, fetcher: &F, url: &Url) -> bool {
        let Some(origin) = origin_of(url) else {
            return true;
        };
        if !self.by_origin.contains_key(&origin) {
            let rules = self.load(fetcher, &origin).await;
            self.by_origin.insert(origin.clone(), rules);
        }

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        let allowed = self
            .by_origin
            .get(&origin)
            .is_none_or(|rules| rules.is_allowed(&path));
        if !allowed {
            debug!("Disallowed by robots.txt");
        }
        allowed
    }

    async fn load<F: Fetch>(&self, fetcher: &F, origin: &str) -> RobotsRules {
        let robots_url = format!("{origin}/robots.txt");
        match fetcher.get(&robots_url, self.timeout).await {
            Ok(page) if page.is_ok() => {
                let rules = RobotsRules::parse(&page.body, &self.agent);
                info!(%robots_url, rules = rules.rules.len(), "Loaded robots.txt");
                rules
            }
            Ok(page) if page.status == 401 || page.status == 403 => {
                info!(%robots_url, status = page.status, "robots.txt forbidden; treating site as disallowed");
                RobotsRules::deny_all()
            }
            Ok(page) => {
                debug!(%robots_url, status = page.status, "No usable robots.txt; allowing all");
                RobotsRules::allow_all()
            }
            Err(e) => {
                debug!(%robots_url, error = %e, "robots.txt fetch failed; allowing all");
                RobotsRules::allow_all()
            }
        }
    }
}
