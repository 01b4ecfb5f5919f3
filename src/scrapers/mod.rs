//! Network-facing stages of the pipeline.
//!
//! Each stage talks to the web only through [`crate::fetch::Fetch`] and
//! never fails the run: a bad probe, page or robots.txt is logged and
//! skipped.
//!
//! # Stages
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | Website detection | [`detector`] | outlet name | `scheme://host` or nothing |
//! | Crawling | [`crawler`] | base URL | bounded list of article URLs |
//! | robots.txt | [`robots`] | any URL | allowed / disallowed, cached per origin |
//! | Extraction | [`extractor`] | article HTML | [`crate::models::ArticleMetadata`] |

pub mod crawler;
pub mod detector;
pub mod extractor;
pub mod robots;
