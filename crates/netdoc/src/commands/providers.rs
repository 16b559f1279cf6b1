//! Provider command handlers.

use std::sync::Arc;

use netdoc_core::{Circuit, EntityId, Provider, Tenant};
use tabled::Tabled;

use crate::cli::{GlobalOpts, ProvidersArgs, ProvidersCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ASN")]
    asn: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Circuits")]
    circuits: usize,
}

fn render(
    session: &Session,
    providers: &[Arc<Provider>],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = session.registry.store();
    let out = output::render_list(
        &global.output,
        providers,
        |p| ProviderRow {
            id: p.id.to_string(),
            name: p.name.clone(),
            asn: p.asn.map(|a| a.to_string()).unwrap_or_default(),
            account: p.account.clone(),
            tenant: util::label_of::<Tenant>(store, p.tenant_id),
            circuits: store.count_where::<Circuit>(|c| c.provider_id == p.id),
        },
        |p| p.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle(session: &Session, args: ProvidersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProvidersCommand::List => {
            let providers = session
                .registry
                .repository()
                .list::<Provider>(&session.ctx, None);
            render(session, &providers, global)
        }

        ProvidersCommand::Import(import) => {
            let reader = util::open_input(&import.file)?;
            let created = session
                .registry
                .bulk()
                .import::<Provider>(&session.ctx, reader)?;
            session.commit()?;
            output::notice(&format!("Imported {} provider(s)", created.len()), global.quiet);
            render(session, &created, global)
        }

        ProvidersCommand::Export(export) => {
            let writer = util::open_output(export.file.as_deref())?;
            let count = session
                .registry
                .bulk()
                .export::<Provider>(&session.ctx, writer)?;
            if export.file.is_some() {
                output::notice(&format!("Exported {count} provider(s)"), global.quiet);
            }
            Ok(())
        }

        ProvidersCommand::Delete { id } => {
            let id = EntityId::new(id);
            let provider = session
                .registry
                .repository()
                .get::<Provider>(&session.ctx, id)?;
            if !util::confirm(&format!("Delete provider '{}'?", provider.name), global.yes)? {
                return Ok(());
            }
            session.registry.inventory().delete_provider(&session.ctx, id)?;
            session.commit()?;
            output::notice("Provider deleted", global.quiet);
            Ok(())
        }
    }
}
