//! Durable dedup store: the single writer of `seen`/`published` state.
//!
//! The store owns two monotonic id sets. `seen` records items that have been
//! committed to the moderation queue; `published` records items whose
//! publication is irreversible. Membership is only ever added, never
//! removed, so concurrent readers never observe retraction.
//!
//! Every mutation rewrites the full snapshot synchronously under the store's
//! mutex, serializing load-modify-persist so two near-simultaneous inserts
//! cannot lose each other's update. A failed persist is logged but does not
//! roll back the in-memory insert: a crash between insert and flush risks a
//! duplicate moderation post on restart, which is the accepted trade-off,
//! not silent data loss.

mod fsync;
mod snapshot;

pub use snapshot::{DedupSnapshot, SnapshotError, load_snapshot, save_snapshot_atomic, try_load_snapshot};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{error, warn};

use crate::types::ItemId;

/// Durable mapping from item identity to lifecycle flags.
///
/// Constructed once at startup and shared by handle; all pipeline
/// components read and write through this four-method contract.
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    inner: Mutex<DedupSnapshot>,
}

impl DedupStore {
    /// Loads the store from `path`.
    ///
    /// A missing file starts empty; an unreadable or corrupt file is logged
    /// and also degrades to empty sets rather than failing startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = match try_load_snapshot(&path) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => DedupSnapshot::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load dedup snapshot, starting empty");
                DedupSnapshot::default()
            }
        };
        DedupStore {
            path,
            inner: Mutex::new(snapshot),
        }
    }

    /// True iff `id` has been committed to the moderation queue.
    pub fn seen(&self, id: &ItemId) -> bool {
        self.lock().seen.contains(id)
    }

    /// Records `id` as seen and persists the snapshot.
    pub fn add(&self, id: ItemId) {
        let mut guard = self.lock();
        guard.seen.insert(id);
        self.persist(&guard);
    }

    /// True iff `id` has been published.
    pub fn published(&self, id: &ItemId) -> bool {
        self.lock().published.contains(id)
    }

    /// Records `id` as published and persists the snapshot.
    pub fn mark_published(&self, id: ItemId) {
        let mut guard = self.lock();
        guard.published.insert(id);
        self.persist(&guard);
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full-snapshot rewrite, called with the mutex held.
    fn persist(&self, snapshot: &DedupSnapshot) {
        if let Err(e) = save_snapshot_atomic(&self.path, snapshot) {
            error!(path = %self.path.display(), error = %e, "failed to persist dedup snapshot");
        }
    }

    /// Both sets are monotonic, so a poisoned mutex still holds a usable
    /// (at worst slightly stale) snapshot; recover rather than propagate.
    fn lock(&self) -> MutexGuard<'_, DedupSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::arb_item_id;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn add_makes_seen_true() {
        let dir = tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("processed.json"));

        let id = ItemId::from("https://example.com/news/1");
        assert!(!store.seen(&id));

        store.add(id.clone());
        assert!(store.seen(&id));
        assert!(!store.published(&id), "seen and published are disjoint");
    }

    #[test]
    fn mark_published_makes_published_true() {
        let dir = tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("processed.json"));

        let id = ItemId::from("https://example.com/news/1");
        assert!(!store.published(&id));

        store.mark_published(id.clone());
        assert!(store.published(&id));
        assert!(!store.seen(&id), "publishing does not imply seen");
    }

    #[test]
    fn state_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.json");

        let a = ItemId::from("a");
        let b = ItemId::from("b");
        {
            let store = DedupStore::load(&path);
            store.add(a.clone());
            store.add(b.clone());
            store.mark_published(a.clone());
        }

        let reloaded = DedupStore::load(&path);
        assert!(reloaded.seen(&a));
        assert!(reloaded.seen(&b));
        assert!(reloaded.published(&a));
        assert!(!reloaded.published(&b));
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("nonexistent.json"));
        assert!(!store.seen(&ItemId::from("a")));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = DedupStore::load(&path);
        assert!(!store.seen(&ItemId::from("a")));

        // The store remains writable despite the corrupt original.
        store.add(ItemId::from("a"));
        assert!(store.seen(&ItemId::from("a")));
    }

    #[test]
    fn legacy_bare_list_loads_as_seen_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.json");
        std::fs::write(&path, r#"["a", "b"]"#).unwrap();

        let store = DedupStore::load(&path);
        assert!(store.seen(&ItemId::from("a")));
        assert!(store.seen(&ItemId::from("b")));
        assert!(!store.published(&ItemId::from("a")));
    }

    #[test]
    fn legacy_file_is_upgraded_on_first_mutation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.json");
        std::fs::write(&path, r#"["a"]"#).unwrap();

        {
            let store = DedupStore::load(&path);
            store.mark_published(ItemId::from("a"));
        }

        let reloaded = DedupStore::load(&path);
        assert!(reloaded.seen(&ItemId::from("a")));
        assert!(reloaded.published(&ItemId::from("a")));
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let store = Arc::new(DedupStore::load(dir.path().join("processed.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..16 {
                        store.add(ItemId(format!("item-{i}-{j}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            for j in 0..16 {
                assert!(store.seen(&ItemId(format!("item-{i}-{j}"))));
            }
        }

        // The persisted snapshot holds every insert too.
        let reloaded = DedupStore::load(store.path());
        for i in 0..8 {
            for j in 0..16 {
                assert!(reloaded.seen(&ItemId(format!("item-{i}-{j}"))));
            }
        }
    }

    proptest! {
        /// Once added, an id stays seen for the process lifetime and across
        /// a reload.
        #[test]
        fn seen_is_monotonic_and_durable(ids in prop::collection::vec(arb_item_id(), 1..20)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("processed.json");

            let store = DedupStore::load(&path);
            for id in &ids {
                store.add(id.clone());
                prop_assert!(store.seen(id));
            }
            for id in &ids {
                prop_assert!(store.seen(id));
            }

            let reloaded = DedupStore::load(&path);
            for id in &ids {
                prop_assert!(reloaded.seen(id));
                prop_assert!(!reloaded.published(id));
            }
        }
    }
}
