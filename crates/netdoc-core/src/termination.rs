// ── Termination integrity engine ──
//
// Owns the circuit ↔ termination relationship. Reference checks run up
// front; the side and interface rules are enforced by the store's unique
// claims at commit time, so two racing writers cannot both succeed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::access::{CallerContext, Repository};
use crate::bulk::fields;
use crate::error::{CoreError, Result};
use crate::model::{
    Circuit, CircuitTermination, EntityId, EntityKind, Interface, Site, TermSide,
};
use crate::store::DataStore;

const XCONNECT_MAX: usize = 50;
const PP_INFO_MAX: usize = 100;

/// Desired state of one circuit termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRequest {
    pub circuit: EntityId,
    pub side: TermSide,
    pub site: EntityId,
    #[serde(default)]
    pub interface: Option<EntityId>,
    pub port_speed: u32,
    #[serde(default)]
    pub upstream_speed: Option<u32>,
    #[serde(default)]
    pub xconnect_id: String,
    #[serde(default)]
    pub pp_info: String,
}

impl TerminationRequest {
    pub fn new(circuit: EntityId, side: TermSide, site: EntityId, port_speed: u32) -> Self {
        Self {
            circuit,
            side,
            site,
            interface: None,
            port_speed,
            upstream_speed: None,
            xconnect_id: String::new(),
            pp_info: String::new(),
        }
    }

    pub fn with_interface(mut self, interface: EntityId) -> Self {
        self.interface = Some(interface);
        self
    }
}

#[derive(Clone, Copy)]
pub struct TerminationEngine<'a> {
    repo: Repository<'a>,
}

impl<'a> TerminationEngine<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Create a termination, or update `existing` in place.
    ///
    /// The circuit of an existing termination cannot change. A conflict on
    /// the side or interface leaves the store exactly as it was.
    pub fn create_or_update(
        &self,
        ctx: &CallerContext,
        existing: Option<EntityId>,
        request: TerminationRequest,
    ) -> Result<Arc<CircuitTermination>> {
        let _held = self
            .repo
            .store()
            .references()
            .hold([request.circuit, request.site].into_iter().chain(request.interface));
        let circuit = self.repo.get::<Circuit>(ctx, request.circuit)?;
        let site = self.repo.get::<Site>(ctx, request.site)?;
        if let Some(interface_id) = request.interface {
            let interface = self.repo.get::<Interface>(ctx, interface_id)?;
            if !interface.is_connectable() {
                return Err(CoreError::validation(
                    "interface",
                    format!(
                        "{} is not a physical, non-management interface",
                        interface.name
                    ),
                ));
            }
        }

        let id = match existing {
            Some(id) => {
                let current = self.repo.get::<CircuitTermination>(ctx, id)?;
                if current.circuit_id != circuit.id {
                    return Err(CoreError::validation(
                        "circuit",
                        "a termination cannot be moved to another circuit",
                    ));
                }
                id
            }
            None => self.repo.store().allocate_id(),
        };

        let termination = CircuitTermination {
            id,
            circuit_id: circuit.id,
            side: request.side,
            site_id: site.id,
            interface_id: request.interface,
            port_speed: request.port_speed,
            upstream_speed: request.upstream_speed,
            xconnect_id: fields::text("xconnect_id", &request.xconnect_id, XCONNECT_MAX, false)?,
            pp_info: fields::text("pp_info", &request.pp_info, PP_INFO_MAX, false)?,
        };

        let store = self.repo.store();
        let written = if existing.is_some() {
            store.update(termination)
        } else {
            store.save(termination)
        };
        let stored = written.inspect_err(|e| {
            warn!(
                circuit = %circuit.cid,
                side = %request.side,
                user = %ctx.username,
                error = %e,
                "termination write rejected"
            );
        })?;
        info!(
            id = %stored.id,
            circuit = %circuit.cid,
            side = %stored.side,
            updated = existing.is_some(),
            user = %ctx.username,
            "termination saved"
        );
        Ok(stored)
    }

    /// Terminations of a circuit, A side first.
    pub fn terminations(
        &self,
        ctx: &CallerContext,
        circuit: EntityId,
    ) -> Result<Vec<Arc<CircuitTermination>>> {
        let circuit = self.repo.get::<Circuit>(ctx, circuit)?;
        let mut found = self
            .repo
            .list_where::<CircuitTermination>(ctx, |t| t.circuit_id == circuit.id);
        found.sort_by_key(|t| t.side);
        Ok(found)
    }

    fn on_side(
        &self,
        ctx: &CallerContext,
        circuit: EntityId,
        side: TermSide,
    ) -> Result<Option<Arc<CircuitTermination>>> {
        Ok(self
            .terminations(ctx, circuit)?
            .into_iter()
            .find(|t| t.side == side))
    }

    pub fn side_a(
        &self,
        ctx: &CallerContext,
        circuit: EntityId,
    ) -> Result<Option<Arc<CircuitTermination>>> {
        self.on_side(ctx, circuit, TermSide::A)
    }

    pub fn side_z(
        &self,
        ctx: &CallerContext,
        circuit: EntityId,
    ) -> Result<Option<Arc<CircuitTermination>>> {
        self.on_side(ctx, circuit, TermSide::Z)
    }

    /// The termination on the opposite side of the same circuit.
    pub fn get_peer(
        &self,
        ctx: &CallerContext,
        termination: EntityId,
    ) -> Result<Option<Arc<CircuitTermination>>> {
        let termination = self.repo.get::<CircuitTermination>(ctx, termination)?;
        let peer = self.on_side(ctx, termination.circuit_id, termination.side.opposite())?;
        debug!(
            termination = %termination.id,
            peer = ?peer.as_ref().map(|p| p.id),
            "peer lookup"
        );
        Ok(peer)
    }

    /// Delete a termination, freeing its side and interface.
    pub fn delete(
        &self,
        ctx: &CallerContext,
        termination: EntityId,
    ) -> Result<Arc<CircuitTermination>> {
        self.repo.get::<CircuitTermination>(ctx, termination)?;
        let removed = self
            .repo
            .store()
            .remove::<CircuitTermination>(termination)
            .ok_or_else(|| CoreError::not_found(EntityKind::CircuitTermination, termination))?;
        info!(id = %termination, user = %ctx.username, "termination deleted");
        Ok(removed)
    }

    /// Cabled to a peer, or held by a circuit termination.
    pub fn is_interface_connected(&self, interface: EntityId) -> bool {
        let store = self.repo.store();
        store.interface_holder(interface).is_some()
            || store
                .get::<Interface>(interface)
                .is_some_and(|i| i.cabled_to.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ConflictKind;
    use crate::testing::Fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn second_termination_on_same_side_conflicts() {
        let fx = Fixture::new();
        let engine = fx.engine();
        engine
            .create_or_update(
                &fx.admin(),
                None,
                TerminationRequest::new(fx.c1, TermSide::A, fx.dc1, 1_000_000),
            )
            .unwrap();

        let err = engine
            .create_or_update(
                &fx.admin(),
                None,
                TerminationRequest::new(fx.c1, TermSide::A, fx.dc2, 1_000_000),
            )
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::DuplicateSide));
        assert_eq!(engine.terminations(&fx.admin(), fx.c1).unwrap().len(), 1);
    }

    #[test]
    fn interface_cannot_back_two_terminations() {
        let fx = Fixture::new();
        let engine = fx.engine();
        fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));

        let err = engine
            .create_or_update(
                &fx.admin(),
                None,
                TerminationRequest::new(fx.c2, TermSide::A, fx.dc1, 10_000).with_interface(fx.xe0),
            )
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::InterfaceInUse));
        // The side claimed before the interface conflict was given back.
        assert!(engine.side_a(&fx.admin(), fx.c2).unwrap().is_none());
        assert!(
            engine
                .create_or_update(
                    &fx.admin(),
                    None,
                    TerminationRequest::new(fx.c2, TermSide::A, fx.dc1, 10_000)
                )
                .is_ok()
        );
    }

    #[test]
    fn update_keeps_own_interface_and_can_move_it() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let id = fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));

        let mut request =
            TerminationRequest::new(fx.c1, TermSide::A, fx.dc1, 10_000).with_interface(fx.xe0);
        request.xconnect_id = "XC-77".into();
        let updated = engine.create_or_update(&fx.admin(), Some(id), request).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.xconnect_id, "XC-77");

        engine
            .create_or_update(
                &fx.admin(),
                Some(id),
                TerminationRequest::new(fx.c1, TermSide::A, fx.dc1, 10_000).with_interface(fx.xe1),
            )
            .unwrap();
        assert!(!engine.is_interface_connected(fx.xe0));
        assert!(engine.is_interface_connected(fx.xe1));
    }

    #[test]
    fn update_cannot_change_circuit() {
        let fx = Fixture::new();
        let id = fx.terminate(fx.c1, "A", fx.dc1, None);
        let err = fx
            .engine()
            .create_or_update(
                &fx.admin(),
                Some(id),
                TerminationRequest::new(fx.c2, TermSide::A, fx.dc1, 10_000),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "circuit"));
    }

    #[test]
    fn peer_lookup_is_an_involution() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let a = fx.terminate(fx.c1, "A", fx.dc1, None);
        assert!(engine.get_peer(&fx.admin(), a).unwrap().is_none());

        let z = fx.terminate(fx.c1, "Z", fx.dc2, None);
        let peer = engine.get_peer(&fx.admin(), a).unwrap().unwrap();
        assert_eq!(peer.id, z);
        assert_eq!(engine.get_peer(&fx.admin(), peer.id).unwrap().unwrap().id, a);
    }

    #[test]
    fn non_connectable_interface_is_rejected() {
        let fx = Fixture::new();
        for interface in [fx.fxp0, fx.lo0, fx.ae0] {
            let err = fx
                .engine()
                .create_or_update(
                    &fx.admin(),
                    None,
                    TerminationRequest::new(fx.c1, TermSide::A, fx.dc1, 10_000)
                        .with_interface(interface),
                )
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "interface"));
        }
    }

    #[test]
    fn hidden_circuit_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .engine()
            .create_or_update(
                &fx.acme(),
                None,
                TerminationRequest::new(fx.globex_circuit, TermSide::A, fx.dc2, 10_000),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: EntityKind::Circuit, .. }));
    }

    #[test]
    fn delete_frees_side_and_interface() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let id = fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));
        engine.delete(&fx.admin(), id).unwrap();

        assert!(!engine.is_interface_connected(fx.xe0));
        assert!(engine.side_a(&fx.admin(), fx.c1).unwrap().is_none());
        fx.terminate(fx.c2, "A", fx.dc1, Some(fx.xe0));
    }

    #[test]
    fn cabled_interface_counts_as_connected() {
        let fx = Fixture::new();
        let engine = fx.engine();
        assert!(engine.is_interface_connected(fx.xe2));
        assert!(!engine.is_interface_connected(fx.xe1));
    }
}
