//! Data models shared by the pipeline stages.
//!
//! - [`Extracted`]: a field value together with how it was obtained
//! - [`ArticleMetadata`]: what the extractor pulls out of one article page
//! - [`AuthorProfile`]: one finalized per-author record
//! - [`Snapshot`]: the JSON document written to disk at every checkpoint
//!
//! The serialized field names of [`AuthorProfile`] and [`Snapshot`] are the
//! on-disk contract read by the serving layer, so they are snake_case and
//! must not change.

use serde::{Deserialize, Serialize};

/// Sentinel used for every field that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Outcome of extracting a single field from a page.
///
/// Extraction never fails outright; a field either came from a concrete
/// signal on the page or fell back to a default. Keeping the distinction
/// lets callers (and tests) see why a field holds its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<T> {
    /// The value was read from the page; `source` names the signal.
    Found { value: T, source: &'static str },
    /// Nothing usable was found; `reason` says what was missing.
    Defaulted { value: T, reason: &'static str },
}

impl<T> Extracted<T> {
    pub fn found(value: T, source: &'static str) -> Self {
        Extracted::Found { value, source }
    }

    pub fn defaulted(value: T, reason: &'static str) -> Self {
        Extracted::Defaulted { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Extracted::Found { value, .. } | Extracted::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Extracted::Found { value, .. } | Extracted::Defaulted { value, .. } => value,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extracted::Found { .. })
    }

    /// The signal name for found values, the reason for defaulted ones.
    pub fn provenance(&self) -> &'static str {
        match self {
            Extracted::Found { source, .. } => source,
            Extracted::Defaulted { reason, .. } => reason,
        }
    }
}

/// Metadata extracted from one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMetadata {
    /// Page title, or [`UNKNOWN`].
    pub title: Extracted<String>,
    /// Raw byline names. Never empty: `["Unknown"]` when no byline was found.
    pub authors: Extracted<Vec<String>>,
    /// Canonical beat label (already passed through beat normalization).
    pub section: Extracted<String>,
    /// ISO-like publication date string, or [`UNKNOWN`].
    pub published: Extracted<String>,
}

impl ArticleMetadata {
    pub fn title(&self) -> &str {
        self.title.value()
    }

    pub fn authors(&self) -> &[String] {
        self.authors.value()
    }

    pub fn section(&self) -> &str {
        self.section.value()
    }

    pub fn published(&self) -> &str {
        self.published.value()
    }
}

/// A finalized per-author profile as written to the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorProfile {
    /// Normalized display name.
    pub name: String,
    /// Dominant beat across all of this author's observed articles.
    pub beat: String,
    /// Title of the most recent article seen.
    pub latest_article: String,
    /// URL of the most recent article seen.
    pub article_url: String,
    /// Publication date of the most recent article seen, or [`UNKNOWN`].
    pub publication_date: String,
    /// Number of processed articles bylined by this author.
    pub articles_count: u32,
}

/// The document written to the output path at every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub outlet_name: String,
    /// Detected base URL, empty until (or unless) detection succeeds.
    pub website: String,
    pub profiles: Vec<AuthorProfile>,
    /// Present while the run is still going; absent in the final snapshot.
    #[serde(rename = "_note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Snapshot {
    /// The snapshot written the instant a run starts.
    pub fn placeholder(outlet_name: &str) -> Self {
        Self {
            outlet_name: outlet_name.to_string(),
            website: String::new(),
            profiles: Vec::new(),
            note: Some(
                "scraper started - partial results may be returned if timeout occurs".to_string(),
            ),
        }
    }

    /// A checkpoint taken while pages are still being processed.
    pub fn in_progress(
        outlet_name: &str,
        website: &str,
        profiles: Vec<AuthorProfile>,
        pages_processed: usize,
    ) -> Self {
        Self {
            outlet_name: outlet_name.to_string(),
            website: website.to_string(),
            profiles,
            note: Some(format!(
                "scrape in progress - {pages_processed} pages processed so far"
            )),
        }
    }

    /// The final snapshot of a completed run.
    pub fn complete(outlet_name: &str, website: &str, profiles: Vec<AuthorProfile>) -> Self {
        Self {
            outlet_name: outlet_name.to_string(),
            website: website.to_string(),
            profiles,
            note: None,
        }
    }
}

/// Every document shape accepted when reading a snapshot back.
///
/// Older writers stored a bare profile array; current ones store a
/// [`Snapshot`] object. Anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDocument {
    Snapshot(Snapshot),
    Profiles(Vec<AuthorProfile>),
}

impl SnapshotDocument {
    pub fn into_profiles(self) -> Vec<AuthorProfile> {
        match self {
            SnapshotDocument::Snapshot(snapshot) => snapshot.profiles,
            SnapshotDocument::Profiles(profiles) => profiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, count: u32) -> AuthorProfile {
        AuthorProfile {
            name: name.to_string(),
            beat: "Politics".to_string(),
            latest_article: "Budget passes".to_string(),
            article_url: "https://example.com/2024/02/01/budget".to_string(),
            publication_date: "2024-02-01".to_string(),
            articles_count: count,
        }
    }

    #[test]
    fn test_extracted_accessors() {
        let found = Extracted::found("2024-01-01".to_string(), "time[datetime]");
        assert!(found.is_found());
        assert_eq!(found.value(), "2024-01-01");
        assert_eq!(found.provenance(), "time[datetime]");

        let defaulted: Extracted<String> = Extracted::defaulted(UNKNOWN.to_string(), "no date");
        assert!(!defaulted.is_found());
        assert_eq!(defaulted.provenance(), "no date");
        assert_eq!(defaulted.into_value(), UNKNOWN);
    }

    #[test]
    fn test_placeholder_serialization() {
        let json = serde_json::to_value(Snapshot::placeholder("The Hindu")).unwrap();
        assert_eq!(json["outlet_name"], "The Hindu");
        assert_eq!(json["website"], "");
        assert_eq!(json["profiles"].as_array().unwrap().len(), 0);
        assert!(json["_note"].as_str().unwrap().contains("partial results"));
    }

    #[test]
    fn test_complete_snapshot_has_no_note() {
        let snapshot = Snapshot::complete("Example", "https://example.com", vec![profile("A", 2)]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("_note"));
        assert!(json.contains("\"articles_count\":2"));
    }

    #[test]
    fn test_document_accepts_object_and_array() {
        let object = r#"{"outlet_name":"X","website":"","profiles":[],"_note":"running"}"#;
        let doc: SnapshotDocument = serde_json::from_str(object).unwrap();
        assert!(matches!(doc, SnapshotDocument::Snapshot(_)));

        let array = serde_json::to_string(&vec![profile("B", 1)]).unwrap();
        let doc: SnapshotDocument = serde_json::from_str(&array).unwrap();
        assert_eq!(doc.into_profiles(), vec![profile("B", 1)]);
    }

    #[test]
    fn test_document_rejects_unexpected_shapes() {
        assert!(serde_json::from_str::<SnapshotDocument>(r#"{"profiles": 3}"#).is_err());
        assert!(serde_json::from_str::<SnapshotDocument>(r#"[{"name": "A"}]"#).is_err());
        assert!(serde_json::from_str::<SnapshotDocument>(r#""just a string""#).is_err());
    }
}
