//! Tenant command handlers.

use std::sync::Arc;

use netdoc_core::{EntityId, NewTenant, Site, Tenant};
use tabled::Tabled;

use crate::cli::{GlobalOpts, TenantsArgs, TenantsCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Sites")]
    sites: usize,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(session: &Session, args: TenantsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = session.registry.store();
    match args.command {
        TenantsCommand::List => {
            let tenants = session.registry.repository().list::<Tenant>(&session.ctx, None);
            let out = output::render_list(
                &global.output,
                &tenants,
                |t: &Arc<Tenant>| TenantRow {
                    id: t.id.to_string(),
                    name: t.name.clone(),
                    slug: t.slug.clone(),
                    sites: store.count_where::<Site>(|s| s.tenant_id == Some(t.id)),
                },
                |t| t.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TenantsCommand::Create {
            name,
            slug,
            description,
        } => {
            let tenant = session.registry.inventory().create_tenant(
                &session.ctx,
                NewTenant {
                    name,
                    slug,
                    description,
                },
            )?;
            session.commit()?;
            output::print_output(&tenant.id.to_string(), global.quiet);
            Ok(())
        }

        TenantsCommand::Delete { id } => {
            let id = EntityId::new(id);
            let tenant = session.registry.repository().get::<Tenant>(&session.ctx, id)?;
            if !util::confirm(&format!("Delete tenant '{}'?", tenant.name), global.yes)? {
                return Ok(());
            }
            session.registry.inventory().delete_tenant(&session.ctx, id)?;
            session.commit()?;
            output::notice("Tenant deleted", global.quiet);
            Ok(())
        }
    }
}
