//! Circuit termination command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use netdoc_core::{
    CircuitTermination, Device, EntityId, Interface, Site, TermSide, TerminationRequest,
};
use tabled::Tabled;

use crate::cli::{GlobalOpts, SideArg, TerminationSetArgs, TerminationsArgs, TerminationsCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TerminationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Speed (Kbps)")]
    port_speed: String,
    #[tabled(rename = "Xconnect")]
    xconnect_id: String,
}

impl From<SideArg> for TermSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::A => Self::A,
            SideArg::Z => Self::Z,
        }
    }
}

/// Device and interface labels for a termination's interface, if any.
fn endpoint(session: &Session, t: &CircuitTermination) -> (String, String) {
    let store = session.registry.store();
    let interface = t.interface_id.and_then(|id| store.get::<Interface>(id));
    interface.map_or_else(Default::default, |i| {
        (
            util::label_of::<Device>(store, Some(i.device_id)),
            i.name.clone(),
        )
    })
}

fn row(session: &Session, t: &CircuitTermination) -> TerminationRow {
    let (device, interface) = endpoint(session, t);
    TerminationRow {
        id: t.id.to_string(),
        side: t.side.to_string(),
        site: util::label_of::<Site>(session.registry.store(), Some(t.site_id)),
        device,
        interface,
        port_speed: t.port_speed.to_string(),
        xconnect_id: t.xconnect_id.clone(),
    }
}

fn detail(session: &Session, t: &CircuitTermination) -> String {
    let r = row(session, t);
    let mut out = String::new();
    let _ = writeln!(out, "Termination {} (side {})", r.id, r.side);
    let _ = writeln!(out, "  Site:      {}", r.site);
    if !r.device.is_empty() {
        let _ = writeln!(out, "  Interface: {} {}", r.device, r.interface);
    }
    let _ = writeln!(out, "  Speed:     {} Kbps", r.port_speed);
    if let Some(upstream) = t.upstream_speed {
        let _ = writeln!(out, "  Upstream:  {upstream} Kbps");
    }
    if !t.xconnect_id.is_empty() {
        let _ = writeln!(out, "  Xconnect:  {}", t.xconnect_id);
    }
    if !t.pp_info.is_empty() {
        let _ = write!(out, "  Patch:     {}", t.pp_info);
    }
    out.trim_end().to_owned()
}

fn render_one(
    session: &Session,
    t: &Arc<CircuitTermination>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        t,
        |t| detail(session, t),
        |t| t.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn request(args: TerminationSetArgs) -> TerminationRequest {
    TerminationRequest {
        circuit: EntityId::new(args.circuit),
        side: args.side.into(),
        site: EntityId::new(args.site),
        interface: args.interface.map(EntityId::new),
        port_speed: args.port_speed,
        upstream_speed: args.upstream_speed,
        xconnect_id: args.xconnect_id,
        pp_info: args.pp_info,
    }
}

pub fn handle(
    session: &Session,
    args: TerminationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let engine = session.registry.terminations();
    match args.command {
        TerminationsCommand::List { circuit } => {
            let terminations = engine.terminations(&session.ctx, EntityId::new(circuit))?;
            let out = output::render_list(
                &global.output,
                &terminations,
                |t: &Arc<CircuitTermination>| row(session, t),
                |t| t.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TerminationsCommand::Set(set) => {
            let existing = set.id.map(EntityId::new);
            let saved = engine.create_or_update(&session.ctx, existing, request(set))?;
            session.commit()?;
            render_one(session, &saved, global)
        }

        TerminationsCommand::Peer { id } => {
            match engine.get_peer(&session.ctx, EntityId::new(id))? {
                Some(peer) => render_one(session, &peer, global),
                None => {
                    output::notice("No termination on the opposite side", global.quiet);
                    Ok(())
                }
            }
        }

        TerminationsCommand::Delete { id } => {
            let id = EntityId::new(id);
            let termination = session
                .registry
                .repository()
                .get::<CircuitTermination>(&session.ctx, id)?;
            let prompt = format!("Delete side {} termination {id}?", termination.side);
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            engine.delete(&session.ctx, id)?;
            session.commit()?;
            output::notice("Termination deleted", global.quiet);
            Ok(())
        }
    }
}
