// Shared inventory for unit tests.
//
//   Acme:   DC1 (R1: edge-1 and an unnamed MX480 tagged AST-0042,
//           R2: edge-2, unracked core-1), circuit C1
//   shared: DC2 (R1: edge-3), Zayo, Level3, circuit C2
//   Globex: Globex HQ (gx-1), Globex Carrier, circuit G1
//
// edge-1 carries xe-0/0/{0,1,2,10}, fxp0 (mgmt), ae0 (lag) and lo0
// (virtual); xe-0/0/2 is cabled to core-1 et-0/0/0.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use crate::access::{CallerContext, Repository};
use crate::bulk::BulkIo;
use crate::chain::ChainResolver;
use crate::inventory::{
    Inventory, NewCircuit, NewCircuitType, NewDevice, NewInterface, NewProvider, NewRack,
    NewSite, NewTenant,
};
use crate::model::{EntityId, InterfaceKind, TermSide};
use crate::natural_key::NaturalKeyResolver;
use crate::store::DataStore;
use crate::termination::{TerminationEngine, TerminationRequest};

pub(crate) struct Fixture {
    pub store: DataStore,
    pub acme_tenant: EntityId,
    pub globex_tenant: EntityId,
    pub dc1: EntityId,
    pub dc2: EntityId,
    pub globex_site: EntityId,
    pub dc1_r1: EntityId,
    pub edge1: EntityId,
    pub globex_device: EntityId,
    pub xe0: EntityId,
    pub xe1: EntityId,
    pub xe2: EntityId,
    pub fxp0: EntityId,
    pub ae0: EntityId,
    pub lo0: EntityId,
    pub globex_port: EntityId,
    pub zayo: EntityId,
    pub level3: EntityId,
    pub long_haul: EntityId,
    pub metro: EntityId,
    pub c1: EntityId,
    pub c2: EntityId,
    pub globex_circuit: EntityId,
}

impl Fixture {
    pub fn new() -> Self {
        let store = DataStore::new();
        let inv = Inventory::new(&store);
        let admin = CallerContext::superuser("admin");

        let tenant = |name: &str, slug: &str| {
            inv.create_tenant(
                &admin,
                NewTenant {
                    name: name.into(),
                    slug: slug.into(),
                    description: String::new(),
                },
            )
            .unwrap()
            .id
        };
        let acme_tenant = tenant("Acme", "acme");
        let globex_tenant = tenant("Globex", "globex");

        let site = |name: &str, slug: &str, tenant: Option<EntityId>| {
            inv.create_site(
                &admin,
                NewSite {
                    name: name.into(),
                    slug: slug.into(),
                    tenant,
                },
            )
            .unwrap()
            .id
        };
        let dc1 = site("DC1", "dc1", Some(acme_tenant));
        let dc2 = site("DC2", "dc2", None);
        let globex_site = site("Globex HQ", "globex-hq", Some(globex_tenant));

        let rack = |name: &str, site: EntityId| {
            inv.create_rack(
                &admin,
                NewRack {
                    name: name.into(),
                    site,
                    tenant: None,
                },
            )
            .unwrap()
            .id
        };
        let dc1_r1 = rack("R1", dc1);
        let dc1_r2 = rack("R2", dc1);
        let dc2_r1 = rack("R1", dc2);

        let device = |name: &str, site: EntityId, rack: Option<EntityId>, tenant| {
            inv.create_device(
                &admin,
                NewDevice {
                    name: Some(name.into()),
                    model: "MX480".into(),
                    asset_tag: None,
                    serial: None,
                    site,
                    rack,
                    tenant,
                },
            )
            .unwrap()
            .id
        };
        let edge1 = device("edge-1", dc1, Some(dc1_r1), Some(acme_tenant));
        device("edge-2", dc1, Some(dc1_r2), Some(acme_tenant));
        let core1 = device("core-1", dc1, None, Some(acme_tenant));
        device("edge-3", dc2, Some(dc2_r1), None);
        let globex_device = device("gx-1", globex_site, None, Some(globex_tenant));
        inv.create_device(
            &admin,
            NewDevice {
                name: None,
                model: "MX480".into(),
                asset_tag: Some("AST-0042".into()),
                serial: Some("JN11F2".into()),
                site: dc1,
                rack: Some(dc1_r1),
                tenant: Some(acme_tenant),
            },
        )
        .unwrap();

        let port = |device: EntityId, name: &str, kind: InterfaceKind, mgmt_only: bool| {
            inv.create_interface(
                &admin,
                NewInterface {
                    device,
                    name: name.into(),
                    kind,
                    mgmt_only,
                },
            )
            .unwrap()
            .id
        };
        let xe0 = port(edge1, "xe-0/0/0", InterfaceKind::Physical, false);
        let xe1 = port(edge1, "xe-0/0/1", InterfaceKind::Physical, false);
        let xe2 = port(edge1, "xe-0/0/2", InterfaceKind::Physical, false);
        port(edge1, "xe-0/0/10", InterfaceKind::Physical, false);
        let fxp0 = port(edge1, "fxp0", InterfaceKind::Physical, true);
        let ae0 = port(edge1, "ae0", InterfaceKind::Lag, false);
        let lo0 = port(edge1, "lo0", InterfaceKind::Virtual, false);
        let core_et0 = port(core1, "et-0/0/0", InterfaceKind::Physical, false);
        let globex_port = port(globex_device, "ge-0/0/0", InterfaceKind::Physical, false);
        inv.cable(&admin, xe2, core_et0).unwrap();

        let zayo = inv
            .create_provider(
                &admin,
                NewProvider {
                    name: "Zayo".into(),
                    slug: "zayo".into(),
                    asn: Some(6461),
                    account: "ACME-001".into(),
                    portal_url: "https://portal.zayo.com/".into(),
                    ..NewProvider::default()
                },
            )
            .unwrap()
            .id;
        let level3 = inv
            .create_provider(
                &admin,
                NewProvider {
                    name: "Level3".into(),
                    slug: "level3".into(),
                    asn: Some(3356),
                    ..NewProvider::default()
                },
            )
            .unwrap()
            .id;
        let globex_carrier = inv
            .create_provider(
                &admin,
                NewProvider {
                    name: "Globex Carrier".into(),
                    slug: "globex-carrier".into(),
                    tenant: Some(globex_tenant),
                    ..NewProvider::default()
                },
            )
            .unwrap()
            .id;

        let circuit_type = |name: &str, slug: &str| {
            inv.create_circuit_type(
                &admin,
                NewCircuitType {
                    name: name.into(),
                    slug: slug.into(),
                },
            )
            .unwrap()
            .id
        };
        let long_haul = circuit_type("Long Haul", "long-haul");
        let metro = circuit_type("Metro", "metro");

        let circuit = |cid: &str, provider, circuit_type, tenant| NewCircuit {
            cid: cid.into(),
            provider,
            circuit_type,
            tenant,
            install_date: None,
            commit_rate: None,
            description: String::new(),
            comments: String::new(),
        };
        let c1 = inv
            .create_circuit(
                &admin,
                NewCircuit {
                    install_date: NaiveDate::from_ymd_opt(2016, 3, 1),
                    commit_rate: Some(10_000),
                    description: "DC1 to DC2".into(),
                    ..circuit("C1", zayo, long_haul, Some(acme_tenant))
                },
            )
            .unwrap()
            .id;
        let c2 = inv
            .create_circuit(&admin, circuit("C2", zayo, metro, None))
            .unwrap()
            .id;
        let globex_circuit = inv
            .create_circuit(
                &admin,
                circuit("G1", globex_carrier, metro, Some(globex_tenant)),
            )
            .unwrap()
            .id;

        Self {
            store,
            acme_tenant,
            globex_tenant,
            dc1,
            dc2,
            globex_site,
            dc1_r1,
            edge1,
            globex_device,
            xe0,
            xe1,
            xe2,
            fxp0,
            ae0,
            lo0,
            globex_port,
            zayo,
            level3,
            long_haul,
            metro,
            c1,
            c2,
            globex_circuit,
        }
    }

    pub fn admin(&self) -> CallerContext {
        CallerContext::superuser("admin")
    }

    pub fn acme(&self) -> CallerContext {
        CallerContext::scoped("acme-ops", [self.acme_tenant])
    }

    pub fn globex(&self) -> CallerContext {
        CallerContext::scoped("globex-ops", [self.globex_tenant])
    }

    pub fn repo(&self) -> Repository<'_> {
        Repository::new(&self.store)
    }

    pub fn inventory(&self) -> Inventory<'_> {
        Inventory::new(&self.store)
    }

    pub fn engine(&self) -> TerminationEngine<'_> {
        TerminationEngine::new(&self.store)
    }

    pub fn resolver(&self) -> ChainResolver<'_> {
        ChainResolver::new(&self.store)
    }

    pub fn natural_keys(&self) -> NaturalKeyResolver<'_> {
        NaturalKeyResolver::new(&self.store)
    }

    pub fn bulk(&self) -> BulkIo<'_> {
        BulkIo::new(&self.store)
    }

    /// Create a termination as admin and return its id.
    pub fn terminate(
        &self,
        circuit: EntityId,
        side: &str,
        site: EntityId,
        interface: Option<EntityId>,
    ) -> EntityId {
        let mut request =
            TerminationRequest::new(circuit, TermSide::parse(side).unwrap(), site, 10_000);
        request.interface = interface;
        self.engine()
            .create_or_update(&self.admin(), None, request)
            .unwrap()
            .id
    }
}
