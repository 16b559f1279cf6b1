// ── Inventory snapshot ──
//
// The whole store as one JSON document. Restoring replays every record
// through the store's write path, so the unique indexes are rebuilt and
// a snapshot that breaks an integrity rule is rejected as a whole.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::model::{
    Circuit, CircuitTermination, CircuitType, Device, EntityId, Interface, Provider, Rack, Site,
    Tenant,
};
use crate::store::{DataStore, Keyed, Record};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub circuit_types: Vec<CircuitType>,
    #[serde(default)]
    pub circuits: Vec<Circuit>,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub racks: Vec<Rack>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub terminations: Vec<CircuitTermination>,
}

fn corrupt(message: impl Into<String>) -> CoreError {
    CoreError::Snapshot {
        message: message.into(),
    }
}

/// Records of one type, ordered by id.
fn sorted<T: Record + Clone>(store: &DataStore) -> Vec<T> {
    let mut records: Vec<T> = store.all::<T>().iter().map(|r| T::clone(r)).collect();
    records.sort_by_key(|r| r.id());
    records
}

impl Snapshot {
    /// Copy the current contents of `store`.
    pub fn capture(store: &DataStore) -> Self {
        Self {
            tenants: sorted(store),
            providers: sorted(store),
            circuit_types: sorted(store),
            circuits: sorted(store),
            sites: sorted(store),
            racks: sorted(store),
            devices: sorted(store),
            interfaces: sorted(store),
            terminations: sorted(store),
        }
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
            + self.providers.len()
            + self.circuit_types.len()
            + self.circuits.len()
            + self.sites.len()
            + self.racks.len()
            + self.devices.len()
            + self.interfaces.len()
            + self.terminations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a fresh store from this snapshot.
    pub fn restore(self) -> Result<DataStore> {
        let store = DataStore::new();
        let total = self.len();

        for tenant in self.tenants {
            put(&store, tenant)?;
        }
        for provider in self.providers {
            require_opt::<Tenant, _>(&store, &provider, provider.tenant_id)?;
            put(&store, provider)?;
        }
        for circuit_type in self.circuit_types {
            put(&store, circuit_type)?;
        }
        for site in self.sites {
            require_opt::<Tenant, _>(&store, &site, site.tenant_id)?;
            put(&store, site)?;
        }
        for rack in self.racks {
            require::<Site, _>(&store, &rack, rack.site_id)?;
            require_opt::<Tenant, _>(&store, &rack, rack.tenant_id)?;
            put(&store, rack)?;
        }
        for device in self.devices {
            require::<Site, _>(&store, &device, device.site_id)?;
            require_opt::<Rack, _>(&store, &device, device.rack_id)?;
            require_opt::<Tenant, _>(&store, &device, device.tenant_id)?;
            put(&store, device)?;
        }
        let mut cabled = Vec::new();
        for interface in self.interfaces {
            require::<Device, _>(&store, &interface, interface.device_id)?;
            if let Some(peer) = interface.cabled_to {
                cabled.push((interface.id, peer));
            }
            put(&store, interface)?;
        }
        for (id, peer) in cabled {
            let symmetric = store
                .get::<Interface>(peer)
                .is_some_and(|p| p.cabled_to == Some(id));
            if !symmetric {
                return Err(corrupt(format!(
                    "interface {id} is cabled to {peer}, which does not cable back"
                )));
            }
        }
        for circuit in self.circuits {
            require::<Provider, _>(&store, &circuit, circuit.provider_id)?;
            require::<CircuitType, _>(&store, &circuit, circuit.type_id)?;
            require_opt::<Tenant, _>(&store, &circuit, circuit.tenant_id)?;
            put(&store, circuit)?;
        }
        for termination in self.terminations {
            require::<Circuit, _>(&store, &termination, termination.circuit_id)?;
            require::<Site, _>(&store, &termination, termination.site_id)?;
            require_opt::<Interface, _>(&store, &termination, termination.interface_id)?;
            put(&store, termination)?;
        }

        info!(records = total, "snapshot restored");
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read a snapshot file. A missing file is an empty inventory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Write the snapshot, replacing `path` only once the new file is complete.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, self.to_json()?)?;
        fs::rename(&staging, path)?;
        debug!(path = %path.display(), records = self.len(), "snapshot saved");
        Ok(())
    }
}

fn put<T: Keyed>(store: &DataStore, record: T) -> Result<()> {
    let id = record.id();
    if store.get::<T>(id).is_some() {
        return Err(corrupt(format!("duplicate {} id {id}", T::KIND.label())));
    }
    store.reserve_id(id);
    store
        .save(record)
        .map_err(|e| corrupt(format!("{} {id}: {e}", T::KIND.label())))?;
    Ok(())
}

fn require<P: Record, T: Record>(store: &DataStore, owner: &T, id: EntityId) -> Result<()> {
    if store.get::<P>(id).is_some() {
        return Ok(());
    }
    Err(corrupt(format!(
        "{} {} references missing {} {id}",
        T::KIND.label(),
        owner.id(),
        P::KIND.label()
    )))
}

fn require_opt<P: Record, T: Record>(
    store: &DataStore,
    owner: &T,
    id: Option<EntityId>,
) -> Result<()> {
    id.map_or(Ok(()), |id| require::<P, T>(store, owner, id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ConflictKind;
    use crate::model::TermSide;
    use crate::testing::Fixture;

    #[test]
    fn restored_store_keeps_enforcing_uniqueness() {
        let fx = Fixture::new();
        let term = fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));
        let store = Snapshot::capture(&fx.store).restore().unwrap();

        assert_eq!(store.interface_holder(fx.xe0), Some(term));
        assert_eq!(store.termination_on_side(fx.c1, TermSide::A), Some(term));
        assert!(store.provider_by_name("Zayo").is_some());

        let mut clash = (*store.get::<CircuitTermination>(term).unwrap()).clone();
        clash.id = store.allocate_id();
        clash.side = TermSide::Z;
        let err = store.save(clash).unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::InterfaceInUse));
    }

    #[test]
    fn new_ids_follow_the_highest_restored_id() {
        let fx = Fixture::new();
        let snapshot = Snapshot::capture(&fx.store);
        let highest = snapshot
            .interfaces
            .iter()
            .map(|i| i.id)
            .chain(snapshot.circuits.iter().map(|c| c.id))
            .max()
            .unwrap();
        let store = snapshot.restore().unwrap();
        assert!(store.allocate_id() > highest);
    }

    #[test]
    fn two_terminations_on_one_side_are_rejected() {
        let fx = Fixture::new();
        fx.terminate(fx.c1, "A", fx.dc1, None);
        let mut snapshot = Snapshot::capture(&fx.store);
        let mut twin = snapshot.terminations[0].clone();
        twin.id = EntityId::new(10_000);
        snapshot.terminations.push(twin);

        let err = snapshot.restore().unwrap_err();
        assert!(matches!(err, CoreError::Snapshot { ref message } if message.contains("termination")));
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let fx = Fixture::new();
        let mut snapshot = Snapshot::capture(&fx.store);
        snapshot.racks[0].site_id = EntityId::new(9_999);
        let err = snapshot.restore().unwrap_err();
        assert!(err.to_string().contains("references missing site 9999"));
    }

    #[test]
    fn one_sided_cable_is_rejected() {
        let fx = Fixture::new();
        let mut snapshot = Snapshot::capture(&fx.store);
        let end = snapshot
            .interfaces
            .iter_mut()
            .find(|i| i.id == fx.xe2)
            .unwrap();
        let peer = end.cabled_to.unwrap();
        end.cabled_to = None;
        let err = snapshot.restore().unwrap_err();
        assert!(err.to_string().contains(&format!("interface {peer} is cabled to")));
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.json");
        assert!(Snapshot::load(&path).unwrap().is_empty());

        let fx = Fixture::new();
        let snapshot = Snapshot::capture(&fx.store);
        snapshot.save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
