// ── Record traits ──
//
// `Record` is the public face every stored type shares: identity, scope,
// label and natural ordering. `Keyed` lists the unique columns the store
// claims on write.

use super::collection::EntityCollection;
use super::data_store::DataStore;
use super::index::Claims;
use crate::error::ConflictKind;
use crate::model::{
    Circuit, CircuitTermination, CircuitType, Device, EntityId, EntityKind, Interface, Provider,
    Rack, Site, Tenant,
};
use crate::util::NaturalOrd;

/// A stored entity type.
pub trait Record: Send + Sync + Sized + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Direct scope column. `None` means shared across tenants.
    fn tenant_id(&self) -> Option<EntityId> {
        None
    }

    /// Owning parent, for types scoped through their parent.
    fn parent_id(&self) -> Option<EntityId> {
        None
    }

    /// Natural name shown to operators.
    fn label(&self) -> String;

    /// Natural ordering key. Listings sort by this, then by id.
    fn sort_key(&self, store: &DataStore) -> Vec<NaturalOrd>;

    fn collection(store: &DataStore) -> &EntityCollection<Self>;
}

/// Unique columns of a record type.
pub(crate) trait Keyed: Record {
    /// Claim every unique key of `self`, stopping at the first conflict.
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind>;

    /// Release keys of `self` that `keep` does not also hold.
    fn release_keys(&self, store: &DataStore, keep: Option<&Self>);
}

fn duplicate(field: &'static str) -> impl FnOnce(EntityId) -> ConflictKind {
    move |_| ConflictKind::DuplicateKey { field }
}

fn label_of<T: Record>(store: &DataStore, id: EntityId) -> NaturalOrd {
    T::collection(store)
        .get(id)
        .map_or_else(|| id.to_string(), |r| r.label())
        .into()
}

// ── Tenancy ──────────────────────────────────────────────────────────

impl Record for Tenant {
    const KIND: EntityKind = EntityKind::Tenant;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, _store: &DataStore) -> Vec<NaturalOrd> {
        vec![self.name.as_str().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.tenants
    }
}

impl Keyed for Tenant {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.tenant_names, self.name.clone(), self.id)
            .map_err(duplicate("name"))?;
        claims
            .claim(&store.tenant_slugs, self.slug.clone(), self.id)
            .map_err(duplicate("slug"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.name != self.name) {
            store.tenant_names.release(self.name.as_str(), self.id);
        }
        if keep.is_none_or(|k| k.slug != self.slug) {
            store.tenant_slugs.release(self.slug.as_str(), self.id);
        }
    }
}

// ── Circuits ─────────────────────────────────────────────────────────

impl Record for Provider {
    const KIND: EntityKind = EntityKind::Provider;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        self.tenant_id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, _store: &DataStore) -> Vec<NaturalOrd> {
        vec![self.name.as_str().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.providers
    }
}

impl Keyed for Provider {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.provider_names, self.name.clone(), self.id)
            .map_err(duplicate("name"))?;
        claims
            .claim(&store.provider_slugs, self.slug.clone(), self.id)
            .map_err(duplicate("slug"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.name != self.name) {
            store.provider_names.release(self.name.as_str(), self.id);
        }
        if keep.is_none_or(|k| k.slug != self.slug) {
            store.provider_slugs.release(self.slug.as_str(), self.id);
        }
    }
}

impl Record for CircuitType {
    const KIND: EntityKind = EntityKind::CircuitType;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, _store: &DataStore) -> Vec<NaturalOrd> {
        vec![self.name.as_str().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.circuit_types
    }
}

impl Keyed for CircuitType {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.circuit_type_names, self.name.clone(), self.id)
            .map_err(duplicate("name"))?;
        claims
            .claim(&store.circuit_type_slugs, self.slug.clone(), self.id)
            .map_err(duplicate("slug"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.name != self.name) {
            store.circuit_type_names.release(self.name.as_str(), self.id);
        }
        if keep.is_none_or(|k| k.slug != self.slug) {
            store.circuit_type_slugs.release(self.slug.as_str(), self.id);
        }
    }
}

impl Record for Circuit {
    const KIND: EntityKind = EntityKind::Circuit;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        self.tenant_id
    }

    fn label(&self) -> String {
        self.cid.clone()
    }

    fn sort_key(&self, store: &DataStore) -> Vec<NaturalOrd> {
        vec![
            label_of::<Provider>(store, self.provider_id),
            self.cid.as_str().into(),
        ]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.circuits
    }
}

impl Keyed for Circuit {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(
                &store.circuit_cids,
                (self.provider_id, self.cid.clone()),
                self.id,
            )
            .map_err(duplicate("cid"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.provider_id != self.provider_id || k.cid != self.cid) {
            store
                .circuit_cids
                .release(&(self.provider_id, self.cid.clone()), self.id);
        }
    }
}

impl Record for CircuitTermination {
    const KIND: EntityKind = EntityKind::CircuitTermination;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        Some(self.circuit_id)
    }

    fn label(&self) -> String {
        format!("Termination {}", self.side)
    }

    fn sort_key(&self, store: &DataStore) -> Vec<NaturalOrd> {
        let mut key = store
            .circuits
            .get(self.circuit_id)
            .map_or_else(|| vec![self.circuit_id.to_string().into()], |c| c.sort_key(store));
        key.push(self.side.to_string().into());
        key
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.terminations
    }
}

impl Keyed for CircuitTermination {
    /// The side is claimed before the interface, so a write that loses
    /// the interface race gives its side back on rollback.
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.termination_sides, (self.circuit_id, self.side), self.id)
            .map_err(|_| ConflictKind::DuplicateSide)?;
        if let Some(interface_id) = self.interface_id {
            claims
                .claim(&store.interface_claims, interface_id, self.id)
                .map_err(|_| ConflictKind::InterfaceInUse)?;
        }
        Ok(())
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.circuit_id != self.circuit_id || k.side != self.side) {
            store
                .termination_sides
                .release(&(self.circuit_id, self.side), self.id);
        }
        if let Some(interface_id) = self.interface_id {
            if keep.is_none_or(|k| k.interface_id != self.interface_id) {
                store.interface_claims.release(&interface_id, self.id);
            }
        }
    }
}

// ── Inventory ────────────────────────────────────────────────────────

impl Record for Site {
    const KIND: EntityKind = EntityKind::Site;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        self.tenant_id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, _store: &DataStore) -> Vec<NaturalOrd> {
        vec![self.name.as_str().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.sites
    }
}

impl Keyed for Site {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.site_names, self.name.clone(), self.id)
            .map_err(duplicate("name"))?;
        claims
            .claim(&store.site_slugs, self.slug.clone(), self.id)
            .map_err(duplicate("slug"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.name != self.name) {
            store.site_names.release(self.name.as_str(), self.id);
        }
        if keep.is_none_or(|k| k.slug != self.slug) {
            store.site_slugs.release(self.slug.as_str(), self.id);
        }
    }
}

impl Record for Rack {
    const KIND: EntityKind = EntityKind::Rack;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        self.tenant_id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, store: &DataStore) -> Vec<NaturalOrd> {
        vec![label_of::<Site>(store, self.site_id), self.name.as_str().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.racks
    }
}

impl Keyed for Rack {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(&store.rack_names, (self.site_id, self.name.clone()), self.id)
            .map_err(duplicate("name"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.site_id != self.site_id || k.name != self.name) {
            store
                .rack_names
                .release(&(self.site_id, self.name.clone()), self.id);
        }
    }
}

impl Record for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<EntityId> {
        self.tenant_id
    }

    fn label(&self) -> String {
        self.display_name()
    }

    fn sort_key(&self, _store: &DataStore) -> Vec<NaturalOrd> {
        vec![self.display_name().into()]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.devices
    }
}

impl Keyed for Device {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => claims
                .claim(&store.device_names, name.to_owned(), self.id)
                .map_err(duplicate("name")),
            None => Ok(()),
        }
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if let Some(name) = self.name.as_deref() {
            if keep.is_none_or(|k| k.name != self.name) {
                store.device_names.release(name, self.id);
            }
        }
    }
}

impl Record for Interface {
    const KIND: EntityKind = EntityKind::Interface;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        Some(self.device_id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self, store: &DataStore) -> Vec<NaturalOrd> {
        vec![
            label_of::<Device>(store, self.device_id),
            self.name.as_str().into(),
        ]
    }

    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.interfaces
    }
}

impl Keyed for Interface {
    fn claim_keys<'a>(
        &self,
        store: &'a DataStore,
        claims: &mut Claims<'a>,
    ) -> Result<(), ConflictKind> {
        claims
            .claim(
                &store.interface_names,
                (self.device_id, self.name.clone()),
                self.id,
            )
            .map_err(duplicate("name"))
    }

    fn release_keys(&self, store: &DataStore, keep: Option<&Self>) {
        if keep.is_none_or(|k| k.device_id != self.device_id || k.name != self.name) {
            store
                .interface_names
                .release(&(self.device_id, self.name.clone()), self.id);
        }
    }
}
