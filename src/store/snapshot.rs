//! Persisted layout of the dedup store.
//!
//! # File Format
//!
//! One JSON record with two named, order-irrelevant id lists:
//!
//! ```json
//! { "seen": ["https://...", ...], "published": ["https://...", ...] }
//! ```
//!
//! A legacy format is still accepted on load: a bare JSON list of ids,
//! interpreted as `seen` with an empty `published`. Either list may be
//! absent in the record form and defaults to empty.
//!
//! # Atomic Writes
//!
//! Snapshots are written atomically with a write-to-temp-then-rename
//! pattern (write `<path>.tmp`, fsync it, rename over `<path>`, fsync the
//! directory), so readers always see either the old or new snapshot, never
//! a partial write.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fsync::{fsync_dir, fsync_file};
use crate::types::ItemId;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// The persisted dedup state: two monotonic id sets.
///
/// `BTreeSet` keeps the serialized lists sorted, so repeated saves of the
/// same state produce byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DedupSnapshot {
    /// Items that have been committed to the moderation queue.
    pub seen: BTreeSet<ItemId>,

    /// Items that have been published to the target destination.
    pub published: BTreeSet<ItemId>,
}

/// On-disk shapes accepted on load: the current record form, or the legacy
/// bare list of seen ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Record {
        #[serde(default)]
        seen: BTreeSet<ItemId>,
        #[serde(default)]
        published: BTreeSet<ItemId>,
    },
    Legacy(BTreeSet<ItemId>),
}

impl<'de> Deserialize<'de> for DedupSnapshot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let file = SnapshotFile::deserialize(deserializer)?;
        Ok(match file {
            SnapshotFile::Record { seen, published } => DedupSnapshot { seen, published },
            SnapshotFile::Legacy(seen) => DedupSnapshot {
                seen,
                published: BTreeSet::new(),
            },
        })
    }
}

/// Saves a snapshot atomically to disk, creating parent directories as
/// needed.
///
/// # Errors
///
/// Returns an error if any IO operation or the serialization fails.
pub fn save_snapshot_atomic(path: &Path, snapshot: &DedupSnapshot) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Loads a snapshot from disk, accepting both formats.
pub fn load_snapshot(path: &Path) -> Result<DedupSnapshot> {
    let bytes = std::fs::read(path)?;
    let snapshot: DedupSnapshot = serde_json::from_slice(&bytes)?;
    Ok(snapshot)
}

/// Attempts to load a snapshot, returning `None` if the file doesn't exist.
///
/// Other errors (unreadable file, malformed JSON) are propagated; the store
/// decides whether to degrade to empty sets.
pub fn try_load_snapshot(path: &Path) -> Result<Option<DedupSnapshot>> {
    match load_snapshot(path) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::arb_item_id;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn arb_snapshot() -> impl Strategy<Value = DedupSnapshot> {
        (
            prop::collection::btree_set(arb_item_id(), 0..10),
            prop::collection::btree_set(arb_item_id(), 0..10),
        )
            .prop_map(|(seen, published)| DedupSnapshot { seen, published })
    }

    proptest! {
        /// Snapshot serialization roundtrip preserves both sets.
        #[test]
        fn snapshot_serde_roundtrip(snapshot in arb_snapshot()) {
            let json = serde_json::to_string(&snapshot).unwrap();
            let parsed: DedupSnapshot = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(snapshot, parsed);
        }

        /// Atomic save and load roundtrip preserves both sets.
        #[test]
        fn atomic_save_load_roundtrip(snapshot in arb_snapshot()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("processed.json");

            save_snapshot_atomic(&path, &snapshot).unwrap();
            let loaded = load_snapshot(&path).unwrap();

            prop_assert_eq!(snapshot, loaded);
        }

        /// A legacy bare list loads as `seen` with an empty `published`.
        #[test]
        fn legacy_bare_list_loads_as_seen(ids in prop::collection::btree_set(arb_item_id(), 0..10)) {
            let json = serde_json::to_string(&ids).unwrap();
            let parsed: DedupSnapshot = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed.seen, ids);
            prop_assert!(parsed.published.is_empty());
        }

        /// Temp file is cleaned up after a successful save.
        #[test]
        fn temp_file_cleaned_up(snapshot in arb_snapshot()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("processed.json");
            let tmp_path = path.with_extension("json.tmp");

            save_snapshot_atomic(&path, &snapshot).unwrap();

            prop_assert!(path.exists(), "snapshot file should exist");
            prop_assert!(!tmp_path.exists(), "temp file should be cleaned up");
        }
    }

    #[test]
    fn record_with_missing_lists_defaults_to_empty() {
        let parsed: DedupSnapshot = serde_json::from_str(r#"{"seen": ["a"]}"#).unwrap();
        assert_eq!(parsed.seen.len(), 1);
        assert!(parsed.published.is_empty());

        let parsed: DedupSnapshot = serde_json::from_str("{}").unwrap();
        assert!(parsed.seen.is_empty());
        assert!(parsed.published.is_empty());
    }

    #[test]
    fn try_load_nonexistent_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.json");

        let result = try_load_snapshot(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data/nested/processed.json");

        save_snapshot_atomic(&path, &DedupSnapshot::default()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn serialized_lists_are_sorted() {
        let mut snapshot = DedupSnapshot::default();
        snapshot.seen.insert(ItemId::from("b"));
        snapshot.seen.insert(ItemId::from("a"));

        let json = serde_json::to_string(&snapshot).unwrap();
        let a = json.find("\"a\"").unwrap();
        let b = json.find("\"b\"").unwrap();
        assert!(a < b, "got: {json}");
    }
}
