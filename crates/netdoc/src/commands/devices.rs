//! Device command handlers.

use std::sync::Arc;

use netdoc_core::{Device, EntityId, Interface, NewDevice, Rack, Site, Tenant};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Rack")]
    rack: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Interfaces")]
    interfaces: usize,
}

pub fn handle(session: &Session, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = session.registry.store();
    match args.command {
        DevicesCommand::List { site } => {
            let site = site.map(EntityId::new);
            let devices = session
                .registry
                .repository()
                .list_where::<Device>(&session.ctx, |d| site.is_none_or(|s| d.site_id == s));
            let out = output::render_list(
                &global.output,
                &devices,
                |d: &Arc<Device>| DeviceRow {
                    id: d.id.to_string(),
                    name: d.display_name(),
                    model: d.model.clone(),
                    site: util::label_of::<Site>(store, Some(d.site_id)),
                    rack: util::label_of::<Rack>(store, d.rack_id),
                    tenant: util::label_of::<Tenant>(store, d.tenant_id),
                    interfaces: store.count_where::<Interface>(|i| i.device_id == d.id),
                },
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Create {
            name,
            site,
            rack,
            model,
            tenant,
        } => {
            let tenant = util::tenant_ref(session, tenant.as_deref())?;
            let device = session.registry.inventory().create_device(
                &session.ctx,
                NewDevice {
                    name: Some(name),
                    model,
                    asset_tag: None,
                    serial: None,
                    site: EntityId::new(site),
                    rack: rack.map(EntityId::new),
                    tenant,
                },
            )?;
            session.commit()?;
            output::print_output(&device.id.to_string(), global.quiet);
            Ok(())
        }

        DevicesCommand::Delete { id } => {
            let id = EntityId::new(id);
            let device = session.registry.repository().get::<Device>(&session.ctx, id)?;
            let prompt = format!("Delete device '{}' and its interfaces?", device.display_name());
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            session.registry.inventory().delete_device(&session.ctx, id)?;
            session.commit()?;
            output::notice("Device deleted", global.quiet);
            Ok(())
        }
    }
}
