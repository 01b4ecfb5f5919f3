//! Article metadata extraction.
//!
//! [`extract_metadata`] turns one fetched page into an [`ArticleMetadata`].
//! It never fails: every field walks a priority chain of signals and falls
//! back to a default, recording which signal (or which absence) produced the
//! value.
//!
//! # Signals
//!
//! | Field | Chain |
//! |-------|-------|
//! | title | `<title>`, first `<h1>` |
//! | published | `time[datetime]`, date meta keys, JSON-LD `datePublished`, dated text |
//! | authors | author metas, `rel=author` links, `itemprop` author/creator, JSON-LD, byline classes |
//! | section | section metas, topic/category classes, breadcrumbs, tag classes, URL path |

use crate::models::{ArticleMetadata, Extracted, UNKNOWN};
use crate::utils::{normalize_beat, normalize_name, path_segments, title_case};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());
static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[content]").unwrap());
static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static REL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[rel]").unwrap());
static ITEMPROP: Lazy<Selector> = Lazy::new(|| Selector::parse("[itemprop]").unwrap());
static BYLINE_CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[class], a[class], p[class], div[class]").unwrap());
static CLASSED: Lazy<Selector> = Lazy::new(|| Selector::parse("[class]").unwrap());
static BREADCRUMB_LINKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".breadcrumb a, nav[aria-label*="breadcrumb"] a, .breadcrumbs a"#).unwrap()
});
static ARTICLE_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[itemprop="articleSection"]"#).unwrap());
static TAG_CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[class], span[class], div[class]").unwrap());
static SECTION_METAS: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    [
        (r#"meta[property="article:section"]"#, "meta:article:section"),
        (r#"meta[name="section"]"#, "meta:section"),
        (r#"meta[itemprop="articleSection"]"#, "meta:articleSection"),
        (r#"meta[name="news_keywords"]"#, "meta:news_keywords"),
        (r#"meta[property="article:tag"]"#, "meta:article:tag"),
        (r#"meta[name="keywords"]"#, "meta:keywords"),
    ]
    .into_iter()
    .map(|(css, label)| (Selector::parse(css).unwrap(), label))
    .collect()
});

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}:\d{2})?").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static AUTHOR_ROLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)author|creator").unwrap());
static BYLINE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)author|byline|writer|journalist|reporter|contributor").unwrap()
});
static BYLINE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(written by|byline|author|reporter|by)\b\s*[:\-]?\s*").unwrap()
});
static NAME_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),| and | & |;").unwrap());
static SECTION_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)section|topic|category|breadcrumb|tag|beat|kicker").unwrap()
});
static TAG_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)tag|topic|kicker|section").unwrap());

/// Meta keys carrying a publication date, highest priority first.
const DATE_META_KEYS: &[&str] = &[
    "article:published_time",
    "article:published",
    "og:published_time",
    "og:updated_time",
    "pubdate",
    "publishdate",
    "publication_date",
    "datepublished",
    "date",
    "sailthru.date",
];

/// Bylines that name a desk rather than a person.
const PLACEHOLDER_AUTHORS: &[&str] = &["staff", "editorial", "team", "contributors"];

/// URL path words recognised as beats.
const BEAT_VOCABULARY: &[&str] = &[
    "politics", "business", "sports", "technology", "tech", "culture", "science", "opinion",
    "health", "environment", "world", "entertainment", "arts", "travel", "education", "finance",
    "economy", "lifestyle", "sport", "news",
];

/// Path segments too generic to name a section.
const GENERIC_SEGMENTS: &[&str] = &["article", "articles", "story", "content", "amp"];

const MAX_SECTION_LABEL: usize = 60;
const DATE_SCAN_CHARS: usize = 2000;

/// Extract title, authors, section and publication date from one page.
pub fn extract_metadata(html: &str, url: &Url) -> ArticleMetadata {
    let document = Html::parse_document(html);
    let json_ld = json_ld_nodes(&document);
    ArticleMetadata {
        title: extract_title(&document),
        authors: extract_authors(&document, &json_ld),
        section: extract_section(&document, url),
        published: extract_published(&document, &json_ld),
    }
}

/// Collapsed, trimmed text content of an element.
fn element_text(el: &ElementRef) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(&joined, " ").trim().to_string()
}

fn extract_title(document: &Html) -> Extracted<String> {
    if let Some(title) = document
        .select(&TITLE)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
    {
        return Extracted::found(title, "title");
    }
    if let Some(heading) = document
        .select(&H1)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
    {
        return Extracted::found(heading, "h1");
    }
    Extracted::defaulted(UNKNOWN.to_string(), "no title or h1")
}

/// Top-level JSON-LD objects, with arrays and `@graph` containers flattened.
fn json_ld_nodes(document: &Html) -> Vec<Value> {
    fn flatten(value: Value, out: &mut Vec<Value>) {
        match value {
            Value::Array(items) => items.into_iter().for_each(|v| flatten(v, out)),
            Value::Object(mut map) => {
                if let Some(graph) = map.remove("@graph") {
                    flatten(graph, out);
                }
                out.push(Value::Object(map));
            }
            _ => {}
        }
    }

    let mut nodes = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
            flatten(value, &mut nodes);
        }
    }
    nodes
}

fn extract_published(document: &Html, json_ld: &[Value]) -> Extracted<String> {
    if let Some(datetime) = document
        .select(&TIME)
        .filter_map(|el| el.value().attr("datetime"))
        .map(str::trim)
        .find(|d| !d.is_empty())
    {
        return Extracted::found(datetime.to_string(), "time[datetime]");
    }

    let metas: Vec<(String, String)> = document
        .select(&META)
        .filter(|el| el.value().attr("http-equiv").is_none())
        .filter_map(|el| {
            let content = el.value().attr("content")?.trim();
            if content.is_empty() {
                return None;
            }
            let key = ["property", "name", "itemprop"]
                .iter()
                .find_map(|attr| el.value().attr(attr))?;
            Some((key.trim().to_lowercase(), content.to_string()))
        })
        .collect();
    for key in DATE_META_KEYS {
        if let Some((_, content)) = metas.iter().find(|(k, _)| k == key) {
            return Extracted::found(content.clone(), "meta date");
        }
    }

    if let Some(date) = json_ld
        .iter()
        .filter_map(|node| node.get("datePublished").and_then(Value::as_str))
        .map(str::trim)
        .find(|d| !d.is_empty())
    {
        return Extracted::found(date.to_string(), "json-ld datePublished");
    }

    let text: String = visible_text(document).chars().take(DATE_SCAN_CHARS).collect();
    if let Some(m) = ISO_DATE.find(&text) {
        return Extracted::found(m.as_str().to_string(), "date in page text");
    }

    Extracted::defaulted(UNKNOWN.to_string(), "no publication date")
}

/// Page text outside `<script>`, `<style>`, `<noscript>` and `<template>`.
fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    parts.join(" ")
}

fn extract_authors(document: &Html, json_ld: &[Value]) -> Extracted<Vec<String>> {
    let mut raw: Vec<(String, &'static str)> = Vec::new();

    for el in document.select(&META) {
        let attrs = el.value();
        let is_author = attrs.attr("name").is_some_and(|n| n.eq_ignore_ascii_case("author"))
            || attrs
                .attr("property")
                .is_some_and(|p| p.eq_ignore_ascii_case("article:author"));
        if let (true, Some(content)) = (is_author, attrs.attr("content")) {
            raw.push((content.trim().to_string(), "meta author"));
        }
    }

    for el in document.select(&REL_LINK) {
        let rel = el.value().attr("rel").unwrap_or_default();
        if rel.split_whitespace().any(|r| r.to_lowercase().contains("author")) {
            raw.push((element_text(&el), "rel=author link"));
        }
    }

    for el in document.select(&ITEMPROP) {
        let role = el.value().attr("itemprop").unwrap_or_default();
        if !AUTHOR_ROLE.is_match(role) {
            continue;
        }
        let text = element_text(&el);
        let text = if text.is_empty() {
            el.value().attr("content").unwrap_or_default().trim().to_string()
        } else {
            text
        };
        raw.push((text, "itemprop author"));
    }

    for node in json_ld {
        for name in json_ld_authors(node.get("author")) {
            raw.push((name, "json-ld author"));
        }
    }

    for el in document.select(&BYLINE_CANDIDATES) {
        if !el.value().classes().any(|c| BYLINE_CLASS.is_match(c)) {
            continue;
        }
        let text = element_text(&el);
        let text = BYLINE_PREFIX.replace(&text, "");
        for name in NAME_SEPARATORS.split(&text) {
            raw.push((name.trim().to_string(), "byline class"));
        }
    }

    let cleaned: Vec<(String, &'static str)> = raw
        .into_iter()
        .map(|(name, source)| (WHITESPACE.replace_all(&name, " ").trim().to_string(), source))
        .filter(|(name, _)| name.chars().count() >= 2)
        .filter(|(name, _)| !PLACEHOLDER_AUTHORS.contains(&name.to_lowercase().as_str()))
        .unique_by(|(name, _)| match normalize_name(name).to_lowercase() {
            key if key.is_empty() => name.to_lowercase(),
            key => key,
        })
        .collect();

    match cleaned.first() {
        Some((_, source)) => {
            let source = *source;
            Extracted::found(cleaned.into_iter().map(|(name, _)| name).collect(), source)
        }
        None => Extracted::defaulted(vec![UNKNOWN.to_string()], "no byline found"),
    }
}

/// Names from a JSON-LD `author` value: a string, a `{name}` object or a list of either.
fn json_ld_authors(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|n| vec![n.to_string()])
            .unwrap_or_default(),
        Some(Value::Array(items)) => items
            .iter()
            .flat_map(|item| json_ld_authors(Some(item)))
            .collect(),
        _ => Vec::new(),
    }
}

fn extract_section(document: &Html, url: &Url) -> Extracted<String> {
    match raw_section(document, url) {
        Some((label, source)) => Extracted::found(normalize_beat(&label), source),
        None => Extracted::defaulted(UNKNOWN.to_string(), "no section signal"),
    }
}

/// The first raw section label found, with the signal that produced it.
fn raw_section(document: &Html, url: &Url) -> Option<(String, &'static str)> {
    for (selector, label) in SECTION_METAS.iter() {
        let first = document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .filter_map(|content| content.split(',').next())
            .map(str::trim)
            .find(|s| !s.is_empty());
        if let Some(value) = first {
            return Some((value.to_string(), *label));
        }
    }

    for el in document.select(&CLASSED) {
        if !el.value().classes().any(|c| SECTION_CLASS.is_match(c)) {
            continue;
        }
        let text = element_text(&el);
        if !text.is_empty()
            && text.chars().count() < MAX_SECTION_LABEL
            && !text.eq_ignore_ascii_case("home")
        {
            return Some((text, "section class"));
        }
    }

    for el in document.select(&BREADCRUMB_LINKS) {
        let text = element_text(&el);
        if !text.is_empty() && !text.eq_ignore_ascii_case("home") {
            return Some((text, "breadcrumb"));
        }
    }

    if let Some(text) = document
        .select(&ARTICLE_SECTION)
        .map(|el| element_text(&el))
        .find(|t| !t.is_empty())
    {
        return Some((text, "itemprop articleSection"));
    }

    for el in document.select(&TAG_CANDIDATES) {
        if el.value().classes().any(|c| TAG_CLASS.is_match(c)) {
            let text = element_text(&el);
            if !text.is_empty() {
                return Some((text, "tag class"));
            }
        }
    }

    section_from_path(url)
}

/// Beat guessed from the URL: a known beat word anywhere in the path,
/// else the first segment unless it is generic.
fn section_from_path(url: &Url) -> Option<(String, &'static str)> {
    let segments = path_segments(url);
    for segment in &segments {
        let token = segment.to_lowercase().replace('-', " ");
        if BEAT_VOCABULARY.contains(&token.as_str()) {
            return Some((token, "url beat word"));
        }
    }
    let first = segments.first()?;
    if GENERIC_SEGMENTS.contains(&first.to_lowercase().as_str()) {
        return None;
    }
    let guess = title_case(&first.replace('-', " "));
    if guess.trim().is_empty() {
        return None;
    }
    Some((guess, "url first segment"))
}
