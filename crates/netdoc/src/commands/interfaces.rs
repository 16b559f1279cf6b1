//! Interface command handlers.

use std::sync::Arc;

use netdoc_core::{EntityId, Interface, InterfaceKind, NewInterface};
use tabled::Tabled;

use crate::cli::{GlobalOpts, InterfaceKindArg, InterfacesArgs, InterfacesCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Mgmt")]
    mgmt_only: String,
    #[tabled(rename = "Connected")]
    connected: String,
}

impl From<InterfaceKindArg> for InterfaceKind {
    fn from(kind: InterfaceKindArg) -> Self {
        match kind {
            InterfaceKindArg::Physical => Self::Physical,
            InterfaceKindArg::Virtual => Self::Virtual,
            InterfaceKindArg::Lag => Self::Lag,
        }
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "yes".into() } else { String::new() }
}

pub fn handle(
    session: &Session,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let inventory = session.registry.inventory();
    match args.command {
        InterfacesCommand::List { device } => {
            let device = EntityId::new(device);
            let interfaces = session
                .registry
                .repository()
                .list_where::<Interface>(&session.ctx, |i| i.device_id == device);
            let engine = session.registry.terminations();
            let out = output::render_list(
                &global.output,
                &interfaces,
                |i: &Arc<Interface>| InterfaceRow {
                    id: i.id.to_string(),
                    name: i.name.clone(),
                    kind: i.kind.to_string(),
                    mgmt_only: yes_no(i.mgmt_only),
                    connected: yes_no(engine.is_interface_connected(i.id)),
                },
                |i| i.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Create {
            name,
            device,
            kind,
            mgmt_only,
        } => {
            let interface = inventory.create_interface(
                &session.ctx,
                NewInterface {
                    device: EntityId::new(device),
                    name,
                    kind: kind.into(),
                    mgmt_only,
                },
            )?;
            session.commit()?;
            output::print_output(&interface.id.to_string(), global.quiet);
            Ok(())
        }

        InterfacesCommand::Cable { a, b } => {
            inventory.cable(&session.ctx, EntityId::new(a), EntityId::new(b))?;
            session.commit()?;
            output::notice("Cable connected", global.quiet);
            Ok(())
        }

        InterfacesCommand::Uncable { id } => {
            inventory.uncable(&session.ctx, EntityId::new(id))?;
            session.commit()?;
            output::notice("Cable removed", global.quiet);
            Ok(())
        }

        InterfacesCommand::Delete { id } => {
            let id = EntityId::new(id);
            let interface = session
                .registry
                .repository()
                .get::<Interface>(&session.ctx, id)?;
            if !util::confirm(&format!("Delete interface '{}'?", interface.name), global.yes)? {
                return Ok(());
            }
            inventory.delete_interface(&session.ctx, id)?;
            session.commit()?;
            output::notice("Interface deleted", global.quiet);
            Ok(())
        }
    }
}
