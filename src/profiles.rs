//! Per-author aggregation.
//!
//! [`ProfileBook`] folds every (author, article) observation of a run into one
//! entry per normalized author name, then [`ProfileBook::finalize`] turns the
//! entries into the ranked [`AuthorProfile`] list written to the snapshot.

use crate::models::{ArticleMetadata, AuthorProfile, UNKNOWN};
use crate::utils::normalize_name;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

static DATE_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").unwrap());

/// Lower-cased names that never become profiles.
const BLACKLIST: &[&str] = &["staff", "editorial", "team", "contributors", "unknown", "s"];

/// Whether `candidate` looks more recent than `existing`.
///
/// Both strings are free-form dates straight from the page. When both hold a
/// valid `YYYY-MM-DD` (or `YYYY/M/D`) date the later one wins; otherwise the
/// longer string is taken as the more precise one.
pub fn prefer_newer(existing: &str, candidate: &str) -> bool {
    if !is_known(candidate) {
        return false;
    }
    if !is_known(existing) {
        return true;
    }
    match (calendar_date(existing), calendar_date(candidate)) {
        (Some(old), Some(new)) => new > old,
        _ => candidate.len() > existing.len(),
    }
}

fn is_known(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != UNKNOWN
}

fn calendar_date(value: &str) -> Option<NaiveDate> {
    let caps = DATE_PARTS.captures(value)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

#[derive(Debug, Clone)]
struct AuthorEntry {
    name: String,
    /// Beat counts in first-seen order.
    beats: Vec<(String, u32)>,
    latest_title: String,
    latest_url: String,
    latest_date: String,
    count: u32,
}

impl AuthorEntry {
    /// Most frequent beat; the earliest seen wins a tie.
    fn dominant_beat(&self) -> String {
        let mut best: Option<&(String, u32)> = None;
        for beat in &self.beats {
            if best.is_none_or(|b| beat.1 > b.1) {
                best = Some(beat);
            }
        }
        best.map(|(beat, _)| beat.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Author profiles accumulated over one run.
#[derive(Debug, Default)]
pub struct ProfileBook {
    entries: HashMap<String, AuthorEntry>,
}

impl ProfileBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `raw_author` wrote the article at `url`.
    ///
    /// Returns `false` when the name normalizes to nothing and was ignored.
    pub fn observe(&mut self, raw_author: &str, metadata: &ArticleMetadata, url: &str) -> bool {
        let name = normalize_name(raw_author);
        if name.is_empty() {
            return false;
        }
        let beat = metadata.section();
        let known_beat = is_known(beat);

        match self.entries.entry(name.to_lowercase()) {
            Entry::Vacant(slot) => {
                slot.insert(AuthorEntry {
                    name,
                    beats: if known_beat {
                        vec![(beat.to_string(), 1)]
                    } else {
                        Vec::new()
                    },
                    latest_title: metadata.title().to_string(),
                    latest_url: url.to_string(),
                    latest_date: metadata.published().to_string(),
                    count: 1,
                });
            }
            Entry::Occupied(slot) => {
                let entry = slot.into_mut();
                entry.count += 1;
                if known_beat {
                    match entry.beats.iter_mut().find(|(b, _)| b == beat) {
                        Some((_, count)) => *count += 1,
                        None => entry.beats.push((beat.to_string(), 1)),
                    }
                }
                if prefer_newer(&entry.latest_date, metadata.published()) {
                    entry.latest_title = metadata.title().to_string();
                    entry.latest_url = url.to_string();
                    entry.latest_date = metadata.published().to_string();
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that will survive [`ProfileBook::finalize`]'s blacklist.
    pub fn named_len(&self) -> usize {
        self.entries
            .keys()
            .filter(|key| !BLACKLIST.contains(&key.as_str()))
            .count()
    }

    /// Ranked profiles: article count descending, then name ascending,
    /// truncated to `limit` when one is given.
    pub fn finalize(&self, limit: Option<usize>) -> Vec<AuthorProfile> {
        let mut profiles: Vec<AuthorProfile> = self
            .entries
            .iter()
            .filter(|(key, _)| !BLACKLIST.contains(&key.as_str()))
            .map(|(_, entry)| AuthorProfile {
                name: entry.name.clone(),
                beat: entry.dominant_beat(),
                latest_article: entry.latest_title.clone(),
                article_url: entry.latest_url.clone(),
                publication_date: entry.latest_date.clone(),
                articles_count: entry.count,
            })
            .collect();

        profiles.sort_by(|a, b| {
            b.articles_count
                .cmp(&a.articles_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        if let Some(limit) = limit {
            profiles.truncate(limit);
        }
        profiles
    }
}
