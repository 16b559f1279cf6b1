// ── Storage-level uniqueness ──
//
// Each unique column (or column tuple) is a `UniqueIndex` mapping the key
// to the record that owns it. Claims go through the `DashMap` entry API, so
// the check and the insert happen under one shard lock: of two writers
// racing for the same key exactly one wins.

use std::borrow::Borrow;
use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::model::EntityId;

pub(crate) enum Claim {
    /// The key was free and now belongs to the claimant.
    Taken,
    /// The claimant already owned the key.
    AlreadyHeld,
}

pub(crate) struct UniqueIndex<K: Eq + Hash> {
    owners: DashMap<K, EntityId>,
}

impl<K: Eq + Hash> UniqueIndex<K> {
    pub(crate) fn new() -> Self {
        Self {
            owners: DashMap::new(),
        }
    }

    /// Claim `key` for `owner`. Fails with the current owner if another
    /// record holds it.
    pub(crate) fn claim(&self, key: K, owner: EntityId) -> Result<Claim, EntityId> {
        match self.owners.entry(key) {
            Entry::Occupied(held) if *held.get() == owner => Ok(Claim::AlreadyHeld),
            Entry::Occupied(held) => Err(*held.get()),
            Entry::Vacant(free) => {
                free.insert(owner);
                Ok(Claim::Taken)
            }
        }
    }

    /// Release `key` if `owner` still holds it.
    pub(crate) fn release<Q>(&self, key: &Q, owner: EntityId) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.owners.remove_if(key, |_, held| *held == owner).is_some()
    }

    pub(crate) fn owner<Q>(&self, key: &Q) -> Option<EntityId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.owners.get(key).map(|r| *r.value())
    }
}

/// Claims taken by one write. Dropping the set without calling
/// [`commit`](Claims::commit) releases every key it newly took, in reverse order.
pub(crate) struct Claims<'a> {
    undo: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Claims<'a> {
    pub(crate) fn new() -> Self {
        Self { undo: Vec::new() }
    }

    pub(crate) fn claim<K>(
        &mut self,
        index: &'a UniqueIndex<K>,
        key: K,
        owner: EntityId,
    ) -> Result<(), EntityId>
    where
        K: Eq + Hash + Clone + 'a,
    {
        if let Claim::Taken = index.claim(key.clone(), owner)? {
            self.undo.push(Box::new(move || {
                index.release(&key, owner);
            }));
        }
        Ok(())
    }

    pub(crate) fn commit(mut self) {
        self.undo.clear();
    }
}

impl Drop for Claims<'_> {
    fn drop(&mut self) {
        while let Some(undo) = self.undo.pop() {
            undo();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_idempotent_for_the_owner() {
        let idx: UniqueIndex<String> = UniqueIndex::new();
        assert!(matches!(idx.claim("acme".into(), EntityId::new(1)), Ok(Claim::Taken)));
        assert!(matches!(
            idx.claim("acme".into(), EntityId::new(1)),
            Ok(Claim::AlreadyHeld)
        ));
        assert_eq!(idx.claim("acme".into(), EntityId::new(2)).err(), Some(EntityId::new(1)));
    }

    #[test]
    fn release_requires_matching_owner() {
        let idx: UniqueIndex<String> = UniqueIndex::new();
        let _ = idx.claim("acme".into(), EntityId::new(1));
        assert!(!idx.release("acme", EntityId::new(2)));
        assert_eq!(idx.owner("acme"), Some(EntityId::new(1)));
        assert!(idx.release("acme", EntityId::new(1)));
        assert_eq!(idx.owner("acme"), None);
    }

    #[test]
    fn dropped_claims_roll_back_new_keys_only() {
        let names: UniqueIndex<String> = UniqueIndex::new();
        let slugs: UniqueIndex<String> = UniqueIndex::new();
        let _ = names.claim("kept".into(), EntityId::new(5));

        {
            let mut claims = Claims::new();
            claims.claim(&names, "kept".into(), EntityId::new(5)).ok();
            claims.claim(&slugs, "fresh".into(), EntityId::new(5)).ok();
            assert_eq!(slugs.owner("fresh"), Some(EntityId::new(5)));
        }

        assert_eq!(names.owner("kept"), Some(EntityId::new(5)));
        assert_eq!(slugs.owner("fresh"), None);
    }

    #[test]
    fn committed_claims_survive_drop() {
        let idx: UniqueIndex<(EntityId, String)> = UniqueIndex::new();
        let mut claims = Claims::new();
        claims
            .claim(&idx, (EntityId::new(1), "C1".into()), EntityId::new(9))
            .ok();
        claims.commit();
        assert_eq!(idx.owner(&(EntityId::new(1), "C1".to_owned())), Some(EntityId::new(9)));
    }

    #[test]
    fn racing_claims_have_exactly_one_winner() {
        let idx: UniqueIndex<EntityId> = UniqueIndex::new();
        let wins = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|s| {
            for owner in 1..=8u64 {
                let (idx, wins) = (&idx, &wins);
                s.spawn(move || {
                    if idx.claim(EntityId::new(100), EntityId::new(owner)).is_ok() {
                        wins.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(wins.into_inner(), 1);
    }
}
