// ── Generic entity collection ──
//
// Concurrent storage with O(1) lookups by id and a shared snapshot
// that is rebuilt on every mutation.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::EntityId;

/// A concurrent collection for a single entity type.
///
/// Uses `DashMap` for O(1) lookups and a `watch` channel to hold the
/// current snapshot, so readers never contend with each other. Every
/// mutation bumps a version counter and rebuilds the snapshot.
pub struct EntityCollection<T: Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns the stored handle.
    #[cfg(test)]
    pub(crate) fn upsert(&self, id: EntityId, entity: T) -> Arc<T> {
        let stored = Arc::new(entity);
        self.by_id.insert(id, Arc::clone(&stored));

        self.rebuild_snapshot();
        self.bump_version();

        stored
    }

    /// Insert or replace `id` while holding its map entry, so writes to
    /// one id never interleave. `build` sees the current value and returns
    /// the replacement; an error leaves the slot untouched.
    pub(crate) fn write<E>(
        &self,
        id: EntityId,
        build: impl FnOnce(Option<&Arc<T>>) -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let stored = match self.by_id.entry(id) {
            Entry::Occupied(mut slot) => {
                let next = Arc::new(build(Some(slot.get()))?);
                slot.insert(Arc::clone(&next));
                next
            }
            Entry::Vacant(slot) => {
                let next = Arc::new(build(None)?);
                slot.insert(Arc::clone(&next));
                next
            }
        };

        // The entry is released here; rebuilding reads every shard.
        self.rebuild_snapshot();
        self.bump_version();

        Ok(stored)
    }

    /// Remove an entity by id. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, id: EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(&id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Get the current snapshot (cheap `Arc` clone). Order is unspecified.
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a fresh snapshot. Collection happens inside
    /// `send_modify` so concurrent rebuilds are serialized and the last one
    /// always observes every completed insert.
    fn rebuild_snapshot(&self) {
        self.snapshot.send_modify(|snap| {
            *snap = Arc::new(self.by_id.iter().map(|r| Arc::clone(r.value())).collect());
        });
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_get() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(EntityId::new(1), "hello".into());
        assert_eq!(*col.get(EntityId::new(1)).unwrap(), "hello");
        assert!(col.contains(EntityId::new(1)));
        assert!(!col.contains(EntityId::new(2)));
    }

    #[test]
    fn failed_write_leaves_slot_untouched() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(EntityId::new(1), "v1".into());
        let version = col.version();

        let err = col
            .write(EntityId::new(1), |current| {
                assert_eq!(current.map(|s| s.as_str()), Some("v1"));
                Err::<String, _>("rejected")
            })
            .unwrap_err();
        assert_eq!(err, "rejected");
        assert_eq!(*col.get(EntityId::new(1)).unwrap(), "v1");
        assert_eq!(col.version(), version);

        let stored = col.write(EntityId::new(2), |current| {
            assert!(current.is_none());
            Ok::<_, &str>("fresh".to_owned())
        });
        assert_eq!(*stored.unwrap(), "fresh");
        assert_eq!(col.snapshot().len(), 2);
    }

    #[test]
    fn upsert_replaces_existing_value() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(EntityId::new(1), "v1".into());
        col.upsert(EntityId::new(1), "v2".into());
        assert_eq!(col.len(), 1);
        assert_eq!(*col.get(EntityId::new(1)).unwrap(), "v2");
    }

    #[test]
    fn remove_returns_value_and_updates_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(EntityId::new(1), "a".into());
        col.upsert(EntityId::new(2), "b".into());
        assert_eq!(col.snapshot().len(), 2);

        assert_eq!(*col.remove(EntityId::new(1)).unwrap(), "a");
        assert!(col.remove(EntityId::new(1)).is_none());
        assert_eq!(col.snapshot().len(), 1);
        assert!(col.get(EntityId::new(1)).is_none());
    }

    #[test]
    fn version_bumps_only_on_effective_mutation() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert_eq!(col.version(), 0);
        col.upsert(EntityId::new(1), "a".into());
        assert_eq!(col.version(), 1);
        col.remove(EntityId::new(9));
        assert_eq!(col.version(), 1);
        col.remove(EntityId::new(1));
        assert_eq!(col.version(), 2);
        assert!(col.is_empty());
    }

    #[test]
    fn concurrent_inserts_all_reach_the_snapshot() {
        let col: EntityCollection<u64> = EntityCollection::new();
        std::thread::scope(|s| {
            for t in 0..4u64 {
                let col = &col;
                s.spawn(move || {
                    for i in 0..50u64 {
                        col.upsert(EntityId::new(t * 100 + i), i);
                    }
                });
            }
        });
        assert_eq!(col.len(), 200);
        assert_eq!(col.snapshot().len(), 200);
    }
}
