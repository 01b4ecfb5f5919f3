//! Output written by a run.
//!
//! # Submodules
//!
//! - [`checkpoint`]: atomic JSON snapshots of the profile list, plus the
//!   strict reader used by consumers of the file
//!
//! # Output Structure
//!
//! ```text
//! data.json
//! {
//!   "outlet_name": "The Hindu",
//!   "website": "https://www.thehindu.com",
//!   "profiles": [
//!     { "name", "beat", "latest_article", "article_url",
//!       "publication_date", "articles_count" }
//!   ],
//!   "_note": "..."            # only while the run is in progress
//! }
//! ```

pub mod checkpoint;
