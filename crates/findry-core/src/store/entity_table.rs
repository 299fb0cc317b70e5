// ── Normalized entity table ──
//
// Lock-free id -> entity storage with push-based change notification via
// `watch` channels. The pagination engine only ever reads this table; writes
// go through the normalization boundary (`store::normalize`).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::EntityId;

/// A lock-free, reactive table of normalized entities for one collection.
///
/// Every mutation bumps a version counter and rebuilds the snapshot that
/// subscribers receive. Snapshot iteration order is unspecified; ordered
/// reads go through the pagination store's id lists.
pub struct EntityTable<T: Clone + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityTable<T> {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the id was new.
    pub fn insert(&self, id: EntityId, entity: T) -> bool {
        let is_new = self.by_id.insert(id, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Insert or update a batch with a single snapshot rebuild.
    /// Returns how many ids were new.
    pub fn insert_many(&self, entries: Vec<(EntityId, T)>) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let mut new_count = 0;
        for (id, entity) in entries {
            if self.by_id.insert(id, Arc::new(entity)).is_none() {
                new_count += 1;
            }
        }
        self.rebuild_snapshot();
        self.bump_version();
        new_count
    }

    /// Remove an entity. Returns the removed entity if it existed.
    pub fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up an entity by id.
    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Snapshot changes as a `Stream`, for consumers that compose streams
    /// rather than poll receivers.
    pub fn snapshot_stream(&self) -> WatchStream<Arc<Vec<Arc<T>>>> {
        WatchStream::new(self.snapshot.subscribe())
    }

    /// Remove all entities.
    pub fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EntityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
