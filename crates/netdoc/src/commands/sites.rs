//! Site command handlers.

use std::sync::Arc;

use netdoc_core::{Device, EntityId, NewSite, Rack, Site, Tenant};
use tabled::Tabled;

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Racks")]
    racks: usize,
    #[tabled(rename = "Devices")]
    devices: usize,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(session: &Session, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = session.registry.store();
    match args.command {
        SitesCommand::List => {
            let sites = session.registry.repository().list::<Site>(&session.ctx, None);
            let out = output::render_list(
                &global.output,
                &sites,
                |s: &Arc<Site>| SiteRow {
                    id: s.id.to_string(),
                    name: s.name.clone(),
                    slug: s.slug.clone(),
                    tenant: util::label_of::<Tenant>(store, s.tenant_id),
                    racks: store.count_where::<Rack>(|r| r.site_id == s.id),
                    devices: store.count_where::<Device>(|d| d.site_id == s.id),
                },
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Create { name, slug, tenant } => {
            let tenant = util::tenant_ref(session, tenant.as_deref())?;
            let site = session
                .registry
                .inventory()
                .create_site(&session.ctx, NewSite { name, slug, tenant })?;
            session.commit()?;
            output::print_output(&site.id.to_string(), global.quiet);
            Ok(())
        }

        SitesCommand::Delete { id } => {
            let id = EntityId::new(id);
            let site = session.registry.repository().get::<Site>(&session.ctx, id)?;
            if !util::confirm(&format!("Delete site '{}'?", site.name), global.yes)? {
                return Ok(());
            }
            session.registry.inventory().delete_site(&session.ctx, id)?;
            session.commit()?;
            output::notice("Site deleted", global.quiet);
            Ok(())
        }
    }
}
