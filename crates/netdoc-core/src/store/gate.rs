// ── Reference gate ──
//
// Serializes deletes against writes that reference the deleted record.
// A writer holds every id it points at for the duration of its check and
// save; a delete takes its target exclusively. Ids hash onto a fixed set
// of stripes, so two unrelated ids may share a lock.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::EntityId;

const STRIPES: usize = 64;

pub(crate) struct ReferenceGate {
    stripes: Box<[RwLock<()>]>,
}

/// Shared hold on a set of referenced ids. Released on drop.
#[must_use = "references are only held while the guard lives"]
pub(crate) struct Held<'a> {
    _guards: Vec<RwLockReadGuard<'a, ()>>,
}

/// Exclusive hold on one id about to be deleted. Released on drop.
#[must_use = "the delete is only gated while the guard lives"]
pub(crate) struct Exclusive<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

impl ReferenceGate {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| RwLock::new(())).collect(),
        }
    }

    fn stripe(id: EntityId) -> usize {
        // Lossless: the remainder is below STRIPES.
        #[allow(clippy::cast_possible_truncation)]
        let slot = (id.get() % STRIPES as u64) as usize;
        slot
    }

    /// Keep every id in `ids` from being deleted until the guard drops.
    ///
    /// Stripes are taken in ascending order and each at most once. A
    /// delete only ever holds a single stripe, so holders cannot deadlock.
    pub(crate) fn hold(&self, ids: impl IntoIterator<Item = EntityId>) -> Held<'_> {
        let mut slots: Vec<usize> = ids.into_iter().map(Self::stripe).collect();
        slots.sort_unstable();
        slots.dedup();
        Held {
            _guards: slots
                .into_iter()
                .map(|slot| {
                    self.stripes[slot]
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                })
                .collect(),
        }
    }

    /// Wait for in-flight writers referencing `id`, then block new ones.
    pub(crate) fn exclusive(&self, id: EntityId) -> Exclusive<'_> {
        Exclusive {
            _guard: self.stripes[Self::stripe(id)]
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}
