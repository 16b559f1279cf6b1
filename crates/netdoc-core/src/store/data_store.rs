// ── Central data store ──
//
// Thread-safe storage for every inventory entity. Writes claim their
// unique keys first and only then touch the collection, so a rejected
// write leaves no trace.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::collection::EntityCollection;
use super::gate::ReferenceGate;
use super::index::{Claims, UniqueIndex};
use super::record::{Keyed, Record};
use crate::error::{CoreError, Result};
use crate::model::{
    Circuit, CircuitTermination, CircuitType, Device, EntityId, Interface, Provider, Rack, Site,
    TermSide, Tenant,
};

/// Central store for all inventory entities.
///
/// Reads are served from per-collection snapshots; writes use the
/// per-shard locks inside `DashMap`. Uniqueness indexes are claimed with
/// a single entry operation, so concurrent writers cannot both pass.
pub struct DataStore {
    pub(crate) tenants: EntityCollection<Tenant>,
    pub(crate) providers: EntityCollection<Provider>,
    pub(crate) circuit_types: EntityCollection<CircuitType>,
    pub(crate) circuits: EntityCollection<Circuit>,
    pub(crate) terminations: EntityCollection<CircuitTermination>,
    pub(crate) sites: EntityCollection<Site>,
    pub(crate) racks: EntityCollection<Rack>,
    pub(crate) devices: EntityCollection<Device>,
    pub(crate) interfaces: EntityCollection<Interface>,

    // ── Unique indexes ──
    pub(crate) tenant_names: UniqueIndex<String>,
    pub(crate) tenant_slugs: UniqueIndex<String>,
    pub(crate) provider_names: UniqueIndex<String>,
    pub(crate) provider_slugs: UniqueIndex<String>,
    pub(crate) circuit_type_names: UniqueIndex<String>,
    pub(crate) circuit_type_slugs: UniqueIndex<String>,
    pub(crate) circuit_cids: UniqueIndex<(EntityId, String)>,
    pub(crate) termination_sides: UniqueIndex<(EntityId, TermSide)>,
    pub(crate) interface_claims: UniqueIndex<EntityId>,
    pub(crate) site_names: UniqueIndex<String>,
    pub(crate) site_slugs: UniqueIndex<String>,
    pub(crate) rack_names: UniqueIndex<(EntityId, String)>,
    pub(crate) device_names: UniqueIndex<String>,
    pub(crate) interface_names: UniqueIndex<(EntityId, String)>,

    references: ReferenceGate,
    next_id: AtomicU64,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            tenants: EntityCollection::new(),
            providers: EntityCollection::new(),
            circuit_types: EntityCollection::new(),
            circuits: EntityCollection::new(),
            terminations: EntityCollection::new(),
            sites: EntityCollection::new(),
            racks: EntityCollection::new(),
            devices: EntityCollection::new(),
            interfaces: EntityCollection::new(),
            tenant_names: UniqueIndex::new(),
            tenant_slugs: UniqueIndex::new(),
            provider_names: UniqueIndex::new(),
            provider_slugs: UniqueIndex::new(),
            circuit_type_names: UniqueIndex::new(),
            circuit_type_slugs: UniqueIndex::new(),
            circuit_cids: UniqueIndex::new(),
            termination_sides: UniqueIndex::new(),
            interface_claims: UniqueIndex::new(),
            site_names: UniqueIndex::new(),
            site_slugs: UniqueIndex::new(),
            rack_names: UniqueIndex::new(),
            device_names: UniqueIndex::new(),
            interface_names: UniqueIndex::new(),
            references: ReferenceGate::new(),
            next_id: AtomicU64::new(1),
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Allocate a fresh id. Ids are unique across all entity types.
    pub fn allocate_id(&self) -> EntityId {
        EntityId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure future allocations never hand out `id`.
    pub(crate) fn reserve_id(&self, id: EntityId) {
        self.next_id
            .fetch_max(id.get().saturating_add(1), Ordering::Relaxed);
    }

    /// Gate that orders deletes after writes still referencing them.
    pub(crate) fn references(&self) -> &ReferenceGate {
        &self.references
    }

    /// Monotonic counter over all collections. Changes whenever any
    /// collection is written.
    pub fn revision(&self) -> u64 {
        [
            self.tenants.version(),
            self.providers.version(),
            self.circuit_types.version(),
            self.circuits.version(),
            self.terminations.version(),
            self.sites.version(),
            self.racks.version(),
            self.devices.version(),
            self.interfaces.version(),
        ]
        .into_iter()
        .fold(0u64, u64::wrapping_add)
    }

    // ── Generic accessors ────────────────────────────────────────────

    pub fn get<T: Record>(&self, id: EntityId) -> Option<Arc<T>> {
        T::collection(self).get(id)
    }

    /// Every stored record of one type, in unspecified order.
    pub fn all<T: Record>(&self) -> Arc<Vec<Arc<T>>> {
        T::collection(self).snapshot()
    }

    pub fn count_where<T: Record>(&self, pred: impl Fn(&T) -> bool) -> usize {
        T::collection(self)
            .snapshot()
            .iter()
            .filter(|r| pred(r))
            .count()
    }

    // ── Natural-key lookups ──────────────────────────────────────────

    pub fn tenant_by_name(&self, name: &str) -> Option<Arc<Tenant>> {
        self.tenant_names.owner(name).and_then(|id| self.tenants.get(id))
    }

    pub fn provider_by_name(&self, name: &str) -> Option<Arc<Provider>> {
        self.provider_names
            .owner(name)
            .and_then(|id| self.providers.get(id))
    }

    pub fn circuit_type_by_name(&self, name: &str) -> Option<Arc<CircuitType>> {
        self.circuit_type_names
            .owner(name)
            .and_then(|id| self.circuit_types.get(id))
    }

    pub fn site_by_name(&self, name: &str) -> Option<Arc<Site>> {
        self.site_names.owner(name).and_then(|id| self.sites.get(id))
    }

    pub fn circuit_by_cid(&self, provider_id: EntityId, cid: &str) -> Option<Arc<Circuit>> {
        self.circuit_cids
            .owner(&(provider_id, cid.to_owned()))
            .and_then(|id| self.circuits.get(id))
    }

    // ── Termination claims ───────────────────────────────────────────

    /// The termination holding `side` of `circuit_id`, if any.
    pub fn termination_on_side(&self, circuit_id: EntityId, side: TermSide) -> Option<EntityId> {
        self.termination_sides.owner(&(circuit_id, side))
    }

    /// The termination currently holding `interface_id`, if any.
    pub fn interface_holder(&self, interface_id: EntityId) -> Option<EntityId> {
        self.interface_claims.owner(&interface_id)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Store `record`, inserting or replacing by id.
    ///
    /// Unique keys are claimed first; on conflict every key this write
    /// newly took is released and nothing is stored. On replacement the
    /// old record's keys are released only after the new ones are held.
    /// The record's slot stays locked for the whole swap, so two writes
    /// to one id cannot both release the same predecessor.
    pub(crate) fn save<T: Keyed>(&self, record: T) -> Result<Arc<T>> {
        self.write(record, false)
    }

    /// Like [`save`](Self::save), but only replaces: a record removed
    /// in the meantime stays removed.
    pub(crate) fn update<T: Keyed>(&self, record: T) -> Result<Arc<T>> {
        self.write(record, true)
    }

    fn write<T: Keyed>(&self, record: T, must_exist: bool) -> Result<Arc<T>> {
        let id = record.id();
        T::collection(self).write(id, |previous| {
            if must_exist && previous.is_none() {
                return Err(CoreError::NotFound {
                    entity: T::KIND,
                    id,
                });
            }

            let mut claims = Claims::new();
            record
                .claim_keys(self, &mut claims)
                .map_err(|kind| CoreError::conflict(T::KIND, kind))?;
            claims.commit();

            if let Some(previous) = previous {
                previous.release_keys(self, Some(&record));
            }
            Ok(record)
        })
    }

    /// Remove a record and release its unique keys.
    pub(crate) fn remove<T: Keyed>(&self, id: EntityId) -> Option<Arc<T>> {
        let removed = T::collection(self).remove(id)?;
        removed.release_keys(self, None);
        Some(removed)
    }

    /// Replace a record whose unique columns are unchanged. A record
    /// removed in the meantime stays removed and `None` is returned.
    pub(crate) fn replace<T: Record>(&self, record: T) -> Option<Arc<T>> {
        T::collection(self)
            .write(record.id(), |current| current.map(|_| record).ok_or(()))
            .ok()
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("tenants", &self.tenants.len())
            .field("providers", &self.providers.len())
            .field("circuit_types", &self.circuit_types.len())
            .field("circuits", &self.circuits.len())
            .field("terminations", &self.terminations.len())
            .field("sites", &self.sites.len())
            .field("racks", &self.racks.len())
            .field("devices", &self.devices.len())
            .field("interfaces", &self.interfaces.len())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ConflictKind;
    use crate::model::{CustomFields, Timestamps};

    fn provider(store: &DataStore, name: &str, slug: &str) -> Provider {
        Provider {
            id: store.allocate_id(),
            name: name.into(),
            slug: slug.into(),
            asn: None,
            account: String::new(),
            portal_url: String::new(),
            noc_contact: String::new(),
            admin_contact: String::new(),
            comments: String::new(),
            tenant_id: None,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        }
    }

    fn termination(
        store: &DataStore,
        circuit: u64,
        side: TermSide,
        interface: Option<u64>,
    ) -> CircuitTermination {
        CircuitTermination {
            id: store.allocate_id(),
            circuit_id: EntityId::new(circuit),
            side,
            site_id: EntityId::new(1),
            interface_id: interface.map(EntityId::new),
            port_speed: 10_000,
            upstream_speed: None,
            xconnect_id: String::new(),
            pp_info: String::new(),
        }
    }

    #[test]
    fn ids_are_allocated_after_reserved_ones() {
        let store = DataStore::new();
        assert_eq!(store.allocate_id(), EntityId::new(1));
        store.reserve_id(EntityId::new(40));
        assert_eq!(store.allocate_id(), EntityId::new(41));
        store.reserve_id(EntityId::new(3));
        assert_eq!(store.allocate_id(), EntityId::new(42));
    }

    #[test]
    fn duplicate_name_is_rejected_and_slug_not_leaked() {
        let store = DataStore::new();
        store.save(provider(&store, "Zayo", "zayo")).unwrap();

        let err = store.save(provider(&store, "Level3", "zayo")).unwrap_err();
        assert_eq!(
            err.conflict_kind(),
            Some(ConflictKind::DuplicateKey { field: "slug" })
        );
        // "Level3" was claimed before the slug conflict and must be free again.
        assert!(store.provider_by_name("Level3").is_none());
        store.save(provider(&store, "Level3", "level3")).unwrap();
        assert_eq!(store.all::<Provider>().len(), 2);
    }

    #[test]
    fn renaming_releases_the_old_key_only() {
        let store = DataStore::new();
        let original = store.save(provider(&store, "Zayo", "zayo")).unwrap();

        let mut renamed = (*original).clone();
        renamed.name = "Zayo Group".into();
        store.save(renamed).unwrap();

        assert!(store.provider_by_name("Zayo").is_none());
        assert_eq!(store.provider_by_name("Zayo Group").unwrap().id, original.id);
        assert_eq!(store.provider_slugs.owner("zayo"), Some(original.id));
    }

    #[test]
    fn lost_interface_claim_gives_the_side_back() {
        let store = DataStore::new();
        store
            .save(termination(&store, 7, TermSide::A, Some(100)))
            .unwrap();

        let err = store
            .save(termination(&store, 8, TermSide::Z, Some(100)))
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::InterfaceInUse));
        assert_eq!(store.termination_on_side(EntityId::new(8), TermSide::Z), None);
    }

    #[test]
    fn moving_a_termination_releases_its_old_interface() {
        let store = DataStore::new();
        let term = store
            .save(termination(&store, 7, TermSide::A, Some(100)))
            .unwrap();

        let mut moved = (*term).clone();
        moved.interface_id = Some(EntityId::new(101));
        store.save(moved).unwrap();

        assert_eq!(store.interface_holder(EntityId::new(100)), None);
        assert_eq!(store.interface_holder(EntityId::new(101)), Some(term.id));
        assert_eq!(store.termination_on_side(EntityId::new(7), TermSide::A), Some(term.id));
    }

    #[test]
    fn update_does_not_resurrect_a_removed_record() {
        let store = DataStore::new();
        let term = store
            .save(termination(&store, 7, TermSide::A, Some(100)))
            .unwrap();
        store.remove::<CircuitTermination>(term.id).unwrap();

        let mut late = (*term).clone();
        late.interface_id = Some(EntityId::new(101));
        let err = store.update(late).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { id, .. } if id == term.id));
        assert!(store.get::<CircuitTermination>(term.id).is_none());
        assert_eq!(store.interface_holder(EntityId::new(101)), None);
        assert_eq!(store.termination_on_side(EntityId::new(7), TermSide::A), None);
    }

    #[test]
    fn concurrent_moves_of_one_record_leave_only_the_stored_claim() {
        for _ in 0..200 {
            let store = DataStore::new();
            let term = store
                .save(termination(&store, 7, TermSide::A, Some(100)))
                .unwrap();
            let barrier = std::sync::Barrier::new(2);

            std::thread::scope(|s| {
                for target in [101, 102] {
                    let (store, barrier, term) = (&store, &barrier, &term);
                    s.spawn(move || {
                        let mut moved = (**term).clone();
                        moved.interface_id = Some(EntityId::new(target));
                        barrier.wait();
                        store.update(moved).unwrap();
                    });
                }
            });

            let stored = store.get::<CircuitTermination>(term.id).unwrap();
            let held: Vec<u64> = [100, 101, 102]
                .into_iter()
                .filter(|i| store.interface_holder(EntityId::new(*i)).is_some())
                .collect();
            assert_eq!(held, [stored.interface_id.unwrap().get()]);
        }
    }

    #[test]
    fn remove_releases_every_key() {
        let store = DataStore::new();
        let term = store
            .save(termination(&store, 7, TermSide::A, Some(100)))
            .unwrap();
        store.remove::<CircuitTermination>(term.id).unwrap();

        assert_eq!(store.interface_holder(EntityId::new(100)), None);
        assert_eq!(store.termination_on_side(EntityId::new(7), TermSide::A), None);
        assert!(store.remove::<CircuitTermination>(term.id).is_none());
    }

    #[test]
    fn debug_shows_record_counts() {
        let store = DataStore::new();
        store.save(provider(&store, "Zayo", "zayo")).unwrap();
        let rendered = format!("{store:?}");
        assert!(rendered.starts_with("DataStore {"), "{rendered}");
        assert!(rendered.contains("providers: 1"), "{rendered}");
        assert!(rendered.contains("circuits: 0"), "{rendered}");
    }

    #[test]
    fn revision_moves_on_every_write() {
        let store = DataStore::new();
        let before = store.revision();
        let p = store.save(provider(&store, "Zayo", "zayo")).unwrap();
        let after_insert = store.revision();
        assert_ne!(before, after_insert);
        store.remove::<Provider>(p.id);
        assert_ne!(after_insert, store.revision());
    }
}
