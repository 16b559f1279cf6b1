// ── Inventory lifecycle ──
//
// Validated creation of every entity type except terminations (owned by
// the termination engine), cabling, and deletion with referential
// protection. References to other records must be visible to the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::access::{CallerContext, Repository};
use crate::bulk::fields;
use crate::error::{CoreError, FieldError, Result};
use crate::model::{
    Circuit, CircuitTermination, CircuitType, CustomFields, Device, EntityId, EntityKind,
    Interface, InterfaceKind, Provider, Rack, Site, Tenant, Timestamps,
};
use crate::store::{DataStore, Keyed, Record};

// ── Column limits ────────────────────────────────────────────────────

pub(crate) const NAME_MAX: usize = 50;
pub(crate) const SLUG_MAX: usize = 50;
pub(crate) const TENANT_NAME_MAX: usize = 30;
pub(crate) const ACCOUNT_MAX: usize = 30;
pub(crate) const URL_MAX: usize = 200;
pub(crate) const CID_MAX: usize = 50;
pub(crate) const DESCRIPTION_MAX: usize = 100;
pub(crate) const DEVICE_NAME_MAX: usize = 64;
pub(crate) const INTERFACE_NAME_MAX: usize = 30;

// ── Inputs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProvider {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub asn: Option<u32>,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub portal_url: String,
    #[serde(default)]
    pub noc_contact: String,
    #[serde(default)]
    pub admin_contact: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tenant: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCircuitType {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCircuit {
    pub cid: String,
    pub provider: EntityId,
    pub circuit_type: EntityId,
    #[serde(default)]
    pub tenant: Option<EntityId>,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub commit_rate: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSite {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub tenant: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRack {
    pub name: String,
    pub site: EntityId,
    #[serde(default)]
    pub tenant: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub asset_tag: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    pub site: EntityId,
    #[serde(default)]
    pub rack: Option<EntityId>,
    #[serde(default)]
    pub tenant: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInterface {
    pub device: EntityId,
    pub name: String,
    pub kind: InterfaceKind,
    #[serde(default)]
    pub mgmt_only: bool,
}

// ── Inventory ────────────────────────────────────────────────────────

/// Create, cable and delete inventory records.
#[derive(Clone, Copy)]
pub struct Inventory<'a> {
    repo: Repository<'a>,
}

impl<'a> Inventory<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    fn store(&self) -> &'a DataStore {
        self.repo.store()
    }

    /// Resolve an optional tenant reference against the caller's view.
    fn tenant_ref(&self, ctx: &CallerContext, tenant: Option<EntityId>) -> Result<Option<EntityId>> {
        tenant
            .map(|id| self.repo.get::<Tenant>(ctx, id).map(|t| t.id))
            .transpose()
    }

    fn store_new<T: Keyed>(&self, ctx: &CallerContext, record: T) -> Result<Arc<T>> {
        let stored = self.store().save(record).inspect_err(|e| {
            warn!(entity = %T::KIND, user = %ctx.username, error = %e, "create rejected");
        })?;
        info!(entity = %T::KIND, id = %stored.id(), user = %ctx.username, "created");
        Ok(stored)
    }

    // ── Tenancy ──────────────────────────────────────────────────────

    pub fn create_tenant(&self, ctx: &CallerContext, new: NewTenant) -> Result<Arc<Tenant>> {
        let tenant = Tenant {
            id: self.store().allocate_id(),
            name: fields::text("name", &new.name, TENANT_NAME_MAX, true)?,
            slug: fields::slug("slug", &new.slug, TENANT_NAME_MAX)?,
            description: fields::text("description", &new.description, DESCRIPTION_MAX, false)?,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        };
        self.store_new(ctx, tenant)
    }

    // ── Circuits ─────────────────────────────────────────────────────

    pub fn create_provider(&self, ctx: &CallerContext, new: NewProvider) -> Result<Arc<Provider>> {
        if new.asn == Some(0) {
            return Err(FieldError::new(
                "asn",
                format!("Ensure this value is greater than or equal to {}.", fields::ASN_MIN),
            )
            .into());
        }
        let _held = self.store().references().hold(new.tenant);
        let provider = Provider {
            id: self.store().allocate_id(),
            name: fields::text("name", &new.name, NAME_MAX, true)?,
            slug: fields::slug("slug", &new.slug, SLUG_MAX)?,
            asn: new.asn,
            account: fields::text("account", &new.account, ACCOUNT_MAX, false)?,
            portal_url: fields::url("portal_url", &new.portal_url, URL_MAX)?,
            noc_contact: new.noc_contact.trim().to_owned(),
            admin_contact: new.admin_contact.trim().to_owned(),
            comments: new.comments.trim().to_owned(),
            tenant_id: self.tenant_ref(ctx, new.tenant)?,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        };
        self.store_new(ctx, provider)
    }

    pub fn create_circuit_type(
        &self,
        ctx: &CallerContext,
        new: NewCircuitType,
    ) -> Result<Arc<CircuitType>> {
        let circuit_type = CircuitType {
            id: self.store().allocate_id(),
            name: fields::text("name", &new.name, NAME_MAX, true)?,
            slug: fields::slug("slug", &new.slug, SLUG_MAX)?,
        };
        self.store_new(ctx, circuit_type)
    }

    pub fn create_circuit(&self, ctx: &CallerContext, new: NewCircuit) -> Result<Arc<Circuit>> {
        let _held = self.store().references().hold(
            [new.provider, new.circuit_type].into_iter().chain(new.tenant),
        );
        let provider = self.repo.get::<Provider>(ctx, new.provider)?;
        let circuit_type = self.repo.get::<CircuitType>(ctx, new.circuit_type)?;
        let circuit = Circuit {
            id: self.store().allocate_id(),
            cid: fields::text("cid", &new.cid, CID_MAX, true)?,
            provider_id: provider.id,
            type_id: circuit_type.id,
            tenant_id: self.tenant_ref(ctx, new.tenant)?,
            install_date: new.install_date,
            commit_rate: new.commit_rate,
            description: fields::text("description", &new.description, DESCRIPTION_MAX, false)?,
            comments: new.comments.trim().to_owned(),
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        };
        self.store_new(ctx, circuit)
    }

    // ── Sites and racks ──────────────────────────────────────────────

    pub fn create_site(&self, ctx: &CallerContext, new: NewSite) -> Result<Arc<Site>> {
        let _held = self.store().references().hold(new.tenant);
        let site = Site {
            id: self.store().allocate_id(),
            name: fields::text("name", &new.name, NAME_MAX, true)?,
            slug: fields::slug("slug", &new.slug, SLUG_MAX)?,
            tenant_id: self.tenant_ref(ctx, new.tenant)?,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        };
        self.store_new(ctx, site)
    }

    pub fn create_rack(&self, ctx: &CallerContext, new: NewRack) -> Result<Arc<Rack>> {
        let _held = self
            .store()
            .references()
            .hold([new.site].into_iter().chain(new.tenant));
        let site = self.repo.get::<Site>(ctx, new.site)?;
        let rack = Rack {
            id: self.store().allocate_id(),
            name: fields::text("name", &new.name, NAME_MAX, true)?,
            site_id: site.id,
            tenant_id: self.tenant_ref(ctx, new.tenant)?,
        };
        self.store_new(ctx, rack)
    }

    // ── Devices and interfaces ───────────────────────────────────────

    pub fn create_device(&self, ctx: &CallerContext, new: NewDevice) -> Result<Arc<Device>> {
        let _held = self
            .store()
            .references()
            .hold([new.site].into_iter().chain(new.rack).chain(new.tenant));
        let site = self.repo.get::<Site>(ctx, new.site)?;
        let rack_id = match new.rack {
            Some(id) => {
                let rack = self.repo.get::<Rack>(ctx, id)?;
                if rack.site_id != site.id {
                    return Err(CoreError::validation(
                        "rack",
                        format!("rack {} does not belong to site {}", rack.name, site.name),
                    ));
                }
                Some(rack.id)
            }
            None => None,
        };
        let name = match new.name.as_deref() {
            Some(raw) => Some(fields::text("name", raw, DEVICE_NAME_MAX, false)?)
                .filter(|n| !n.is_empty()),
            None => None,
        };
        let device = Device {
            id: self.store().allocate_id(),
            name,
            model: fields::text("model", &new.model, NAME_MAX, true)?,
            asset_tag: new.asset_tag.filter(|t| !t.trim().is_empty()),
            serial: new.serial.filter(|s| !s.trim().is_empty()),
            site_id: site.id,
            rack_id,
            tenant_id: self.tenant_ref(ctx, new.tenant)?,
            timestamps: Timestamps::now(),
            custom_fields: CustomFields::new(),
        };
        self.store_new(ctx, device)
    }

    pub fn create_interface(
        &self,
        ctx: &CallerContext,
        new: NewInterface,
    ) -> Result<Arc<Interface>> {
        let _held = self.store().references().hold([new.device]);
        let device = self.repo.get::<Device>(ctx, new.device)?;
        let interface = Interface {
            id: self.store().allocate_id(),
            device_id: device.id,
            name: fields::text("name", &new.name, INTERFACE_NAME_MAX, true)?,
            kind: new.kind,
            mgmt_only: new.mgmt_only,
            cabled_to: None,
        };
        self.store_new(ctx, interface)
    }

    /// Connect two interfaces with a cable.
    pub fn cable(&self, ctx: &CallerContext, a: EntityId, b: EntityId) -> Result<()> {
        if a == b {
            return Err(CoreError::validation(
                "interface",
                "an interface cannot be cabled to itself",
            ));
        }
        let _held = self.store().references().hold([a, b]);
        let (end_a, end_b) = (
            self.repo.get::<Interface>(ctx, a)?,
            self.repo.get::<Interface>(ctx, b)?,
        );
        for end in [&end_a, &end_b] {
            if end.kind == InterfaceKind::Virtual {
                return Err(CoreError::validation(
                    "interface",
                    format!("virtual interface {} cannot be cabled", end.name),
                ));
            }
            if end.cabled_to.is_some() {
                return Err(CoreError::validation(
                    "interface",
                    format!("interface {} is already cabled", end.name),
                ));
            }
        }

        let mut end_a = (*end_a).clone();
        let mut end_b = (*end_b).clone();
        end_a.cabled_to = Some(b);
        end_b.cabled_to = Some(a);
        // Both ends are held, so neither can vanish before the swap.
        self.store().replace(end_a);
        self.store().replace(end_b);

        info!(a = %a, b = %b, user = %ctx.username, "cabled interfaces");
        Ok(())
    }

    /// Remove the cable attached to `interface`, if any.
    pub fn uncable(&self, ctx: &CallerContext, interface: EntityId) -> Result<()> {
        let _held = self.store().references().hold([interface]);
        let end = self.repo.get::<Interface>(ctx, interface)?;
        let Some(peer) = end.cabled_to else {
            return Ok(());
        };
        self.clear_cable(&end);
        if let Some(far) = self.store().get::<Interface>(peer) {
            self.clear_cable(&far);
        }
        info!(interface = %interface, peer = %peer, user = %ctx.username, "removed cable");
        Ok(())
    }

    fn clear_cable(&self, interface: &Interface) {
        let mut cleared = interface.clone();
        cleared.cabled_to = None;
        self.store().replace(cleared);
    }

    // ── Deletion ─────────────────────────────────────────────────────
    //
    // Each delete holds its target exclusively, and every write that
    // references a record holds it shared, so the protection check and
    // the removal see no referencing write in between.

    /// Refuse deletion while any `T` matches `referenced`.
    fn protect<T: Record>(
        &self,
        entity: EntityKind,
        id: EntityId,
        referenced: impl Fn(&T) -> bool,
    ) -> Result<()> {
        let count = self.store().count_where::<T>(referenced);
        if count == 0 {
            return Ok(());
        }
        warn!(
            entity = %entity,
            id = %id,
            referenced_by = %T::KIND,
            count,
            "delete refused"
        );
        Err(CoreError::ReferentialProtection {
            entity,
            id,
            referenced_by: T::KIND,
            count,
        })
    }

    fn finish_delete<T: Keyed>(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<T>> {
        let removed = self
            .store()
            .remove::<T>(id)
            .ok_or_else(|| CoreError::not_found(T::KIND, id))?;
        info!(entity = %T::KIND, id = %id, user = %ctx.username, "deleted");
        Ok(removed)
    }

    pub fn delete_tenant(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Tenant>> {
        let _gate = self.store().references().exclusive(id);
        let tenant = self.repo.get::<Tenant>(ctx, id)?;
        let owned = Some(tenant.id);
        self.protect::<Provider>(EntityKind::Tenant, id, |r| r.tenant_id == owned)?;
        self.protect::<Circuit>(EntityKind::Tenant, id, |r| r.tenant_id == owned)?;
        self.protect::<Site>(EntityKind::Tenant, id, |r| r.tenant_id == owned)?;
        self.protect::<Rack>(EntityKind::Tenant, id, |r| r.tenant_id == owned)?;
        self.protect::<Device>(EntityKind::Tenant, id, |r| r.tenant_id == owned)?;
        self.finish_delete(ctx, id)
    }

    pub fn delete_provider(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Provider>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<Provider>(ctx, id)?;
        self.protect::<Circuit>(EntityKind::Provider, id, |c| c.provider_id == id)?;
        self.finish_delete(ctx, id)
    }

    pub fn delete_circuit_type(
        &self,
        ctx: &CallerContext,
        id: EntityId,
    ) -> Result<Arc<CircuitType>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<CircuitType>(ctx, id)?;
        self.protect::<Circuit>(EntityKind::CircuitType, id, |c| c.type_id == id)?;
        self.finish_delete(ctx, id)
    }

    /// Delete a circuit together with its terminations.
    pub fn delete_circuit(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Circuit>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<Circuit>(ctx, id)?;
        let terminations: Vec<EntityId> = self
            .store()
            .all::<CircuitTermination>()
            .iter()
            .filter(|t| t.circuit_id == id)
            .map(|t| t.id)
            .collect();
        for termination in &terminations {
            self.store().remove::<CircuitTermination>(*termination);
        }
        if !terminations.is_empty() {
            info!(circuit = %id, count = terminations.len(), "cascaded termination delete");
        }
        self.finish_delete(ctx, id)
    }

    pub fn delete_site(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Site>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<Site>(ctx, id)?;
        self.protect::<Rack>(EntityKind::Site, id, |r| r.site_id == id)?;
        self.protect::<Device>(EntityKind::Site, id, |d| d.site_id == id)?;
        self.protect::<CircuitTermination>(EntityKind::Site, id, |t| t.site_id == id)?;
        self.finish_delete(ctx, id)
    }

    pub fn delete_rack(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Rack>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<Rack>(ctx, id)?;
        self.protect::<Device>(EntityKind::Rack, id, |d| d.rack_id == Some(id))?;
        self.finish_delete(ctx, id)
    }

    pub fn delete_device(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Device>> {
        let _gate = self.store().references().exclusive(id);
        self.repo.get::<Device>(ctx, id)?;
        self.protect::<Interface>(EntityKind::Device, id, |i| i.device_id == id)?;
        self.finish_delete(ctx, id)
    }

    /// Delete an interface. Its cable, if any, goes with it.
    pub fn delete_interface(&self, ctx: &CallerContext, id: EntityId) -> Result<Arc<Interface>> {
        let _gate = self.store().references().exclusive(id);
        let interface = self.repo.get::<Interface>(ctx, id)?;
        self.protect::<CircuitTermination>(EntityKind::Interface, id, |t| {
            t.interface_id == Some(id)
        })?;
        if let Some(peer) = interface.cabled_to.and_then(|p| self.store().get::<Interface>(p)) {
            self.clear_cable(&peer);
        }
        self.finish_delete(ctx, id)
    }
}
