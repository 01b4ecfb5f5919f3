//! Atomic JSON snapshots of the run.
//!
//! The output file is replaced, never edited in place: each checkpoint is
//! written to a `.tmp_data_*` file next to the destination, flushed to disk
//! and renamed over it. A reader (or a run killed mid-write) therefore only
//! ever sees a complete earlier snapshot or a complete new one.
//!
//! Writing never fails the run. If the temp-file route breaks the snapshot
//! is written directly, and if that breaks too the failure is logged and
//! dropped.

use crate::error::{NewsTraceError, Result};
use crate::models::{AuthorProfile, Snapshot, SnapshotDocument};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const TEMP_PREFIX: &str = ".tmp_data_";

/// Writes snapshots to one destination path.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the destination with `snapshot` as pretty-printed JSON.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), profiles = snapshot.profiles.len()))]
    pub fn write(&self, snapshot: &Snapshot) {
        let json = match serde_json::to_string_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Could not serialize snapshot");
                return;
            }
        };

        match self.write_atomic(json.as_bytes()) {
            Ok(()) => debug!("Checkpoint written"),
            Err(e) => {
                warn!(error = %e, "Atomic checkpoint failed; writing in place");
                if let Err(e) = fs::write(&self.path, &json) {
                    warn!(error = %e, "Checkpoint write failed");
                }
            }
        }
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".json")
            .tempfile_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Parse a snapshot file, accepting only the known document shapes.
pub fn read_snapshot_document(path: &Path) -> Result<SnapshotDocument> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(NewsTraceError::Snapshot(format!(
                "missing: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&raw).map_err(|e| {
        NewsTraceError::Snapshot(format!("malformed {}: {e}", path.display()))
    })
}

/// The profile list stored in a snapshot file.
///
/// A missing or malformed file is an error, never an empty list.
pub fn read_profiles(path: &Path) -> Result<Vec<AuthorProfile>> {
    read_snapshot_document(path).map(SnapshotDocument::into_profiles)
}
