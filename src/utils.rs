//! String helpers for names, beats and URLs.
//!
//! This module provides helper functions used throughout the application:
//! - Author name normalization (the key used to merge bylines)
//! - Beat canonicalization against a fixed synonym table
//! - Title-casing and capitalization
//! - URL origin and path helpers shared by the detector and crawler

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::UNKNOWN;

static ZERO_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200b}\u{200c}\u{200d}\u{2060}\u{feff}]").unwrap());
static NAME_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s\-]").unwrap());
static COMBINING_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{M}$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^by\s+").unwrap());
static BEAT_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s|/,&]+").unwrap());
static BEAT_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]+").unwrap());

/// Substring -> canonical beat. Checked in order; the first hit wins.
const BEAT_SYNONYMS: &[(&str, &str)] = &[
    ("breaking", "Breaking"),
    ("world", "World"),
    ("politics", "Politics"),
    ("business", "Business"),
    ("economy", "Business"),
    ("technology", "Technology"),
    ("tech", "Technology"),
    ("sport", "Sports"),
    ("editorial", "Editorial"),
    ("opinion", "Opinion"),
    ("analysis", "Analysis"),
    ("entertainment", "Entertainment"),
    ("lifestyle", "Lifestyle"),
    ("science", "Science"),
    ("health", "Health"),
    ("travel", "Travel"),
    ("news", "News"),
];

/// Normalize a raw byline into a display name.
///
/// Zero-width characters are dropped, punctuation (other than hyphens)
/// becomes whitespace, whitespace is collapsed, any leading `By` words are
/// stripped and the result is title-cased. Anything one character or
/// shorter normalizes to the empty string, which callers treat as "no name".
///
/// Normalizing an already-normalized name returns it unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_name("By   John Smith."), "John Smith");
/// assert_eq!(normalize_name("x"), "");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let s = ZERO_WIDTH.replace_all(raw, "");
    let s = NAME_PUNCTUATION.replace_all(&s, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    let mut s = s.trim();
    while let Some(m) = BY_PREFIX.find(s) {
        s = s[m.end()..].trim_start();
    }
    if s.chars().count() <= 1 {
        return String::new();
    }
    title_case(s)
}

/// Canonicalize a raw section label into a beat.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_beat("Breaking News India"), "Breaking");
/// assert_eq!(normalize_beat("Tech"), "Technology");
/// assert_eq!(normalize_beat("Foobar Desk"), "Foobar");
/// assert_eq!(normalize_beat(""), "Unknown");
/// ```
pub fn normalize_beat(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let spaced = BEAT_SEPARATORS.replace_all(&lowered, " ");
    let cleaned = BEAT_JUNK.replace_all(&spaced, "");
    let cleaned = cleaned.trim();

    if let Some((_, beat)) = BEAT_SYNONYMS.iter().find(|(key, _)| cleaned.contains(key)) {
        return beat.to_string();
    }
    match cleaned.split_whitespace().next() {
        Some(token) => upcase(token),
        None => UNKNOWN.to_string(),
    }
}

/// Title-case a string: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased.
///
/// Combining marks stay attached to their letter without breaking the run.
/// Letters whose case mapping expands to several characters are left as is,
/// which keeps the function idempotent.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    let mut buf = [0u8; 4];
    for c in s.chars() {
        if COMBINING_MARK.is_match(c.encode_utf8(&mut buf)) {
            out.push(c);
        } else if c.is_alphabetic() {
            let mapped: Vec<char> = if in_word {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            match mapped.as_slice() {
                [single] => out.push(*single),
                _ => out.push(c),
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Capitalize the first character of a string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(upcase("hello"), "Hello");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Host with any leading `www.` removed, lower-cased.
pub fn bare_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Non-empty path segments of a URL.
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
