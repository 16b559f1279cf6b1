//! Rack command handlers.

use std::sync::Arc;

use netdoc_core::{Device, EntityId, NewRack, Rack, Site, Tenant};
use tabled::Tabled;

use crate::cli::{GlobalOpts, RacksArgs, RacksCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RackRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Devices")]
    devices: usize,
}

pub fn handle(session: &Session, args: RacksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = session.registry.store();
    match args.command {
        RacksCommand::List { site } => {
            let site = site.map(EntityId::new);
            let racks = session
                .registry
                .repository()
                .list_where::<Rack>(&session.ctx, |r| site.is_none_or(|s| r.site_id == s));
            let out = output::render_list(
                &global.output,
                &racks,
                |r: &Arc<Rack>| RackRow {
                    id: r.id.to_string(),
                    name: r.name.clone(),
                    site: util::label_of::<Site>(store, Some(r.site_id)),
                    tenant: util::label_of::<Tenant>(store, r.tenant_id),
                    devices: store.count_where::<Device>(|d| d.rack_id == Some(r.id)),
                },
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RacksCommand::Create { name, site, tenant } => {
            let tenant = util::tenant_ref(session, tenant.as_deref())?;
            let rack = session.registry.inventory().create_rack(
                &session.ctx,
                NewRack {
                    name,
                    site: EntityId::new(site),
                    tenant,
                },
            )?;
            session.commit()?;
            output::print_output(&rack.id.to_string(), global.quiet);
            Ok(())
        }
    }
}
