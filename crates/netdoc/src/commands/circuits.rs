//! Circuit command handlers.

use std::sync::Arc;

use netdoc_core::{Circuit, CircuitTermination, CircuitType, CoreError, EntityId, Provider, Tenant};
use tabled::Tabled;

use crate::cli::{CircuitsArgs, CircuitsCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CircuitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CID")]
    cid: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Type")]
    circuit_type: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Commit (Kbps)")]
    commit_rate: String,
    #[tabled(rename = "Sides")]
    sides: String,
}

fn render(
    session: &Session,
    circuits: &[Arc<Circuit>],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = session.registry.store();
    let out = output::render_list(
        &global.output,
        circuits,
        |c| {
            let mut sides: Vec<_> = store
                .all::<CircuitTermination>()
                .iter()
                .filter(|t| t.circuit_id == c.id)
                .map(|t| t.side)
                .collect();
            sides.sort_unstable();
            CircuitRow {
                id: c.id.to_string(),
                cid: c.cid.clone(),
                provider: util::label_of::<Provider>(store, Some(c.provider_id)),
                circuit_type: util::label_of::<CircuitType>(store, Some(c.type_id)),
                tenant: util::label_of::<Tenant>(store, c.tenant_id),
                commit_rate: c.commit_rate.map(|r| r.to_string()).unwrap_or_default(),
                sides: sides.iter().map(ToString::to_string).collect::<Vec<_>>().join("/"),
            }
        },
        |c| c.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle(session: &Session, args: CircuitsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CircuitsCommand::List { provider } => {
            let provider = provider
                .map(|name| {
                    session
                        .registry
                        .natural_keys()
                        .resolve::<Provider>(&session.ctx, &name)
                        .map(|p| p.id)
                        .map_err(|e| CliError::from(CoreError::from(e)))
                })
                .transpose()?;
            let circuits = session
                .registry
                .repository()
                .list_where::<Circuit>(&session.ctx, |c| {
                    provider.is_none_or(|p| c.provider_id == p)
                });
            render(session, &circuits, global)
        }

        CircuitsCommand::Import(import) => {
            let reader = util::open_input(&import.file)?;
            let created = session
                .registry
                .bulk()
                .import::<Circuit>(&session.ctx, reader)?;
            session.commit()?;
            output::notice(&format!("Imported {} circuit(s)", created.len()), global.quiet);
            render(session, &created, global)
        }

        CircuitsCommand::Export(export) => {
            let writer = util::open_output(export.file.as_deref())?;
            let count = session
                .registry
                .bulk()
                .export::<Circuit>(&session.ctx, writer)?;
            if export.file.is_some() {
                output::notice(&format!("Exported {count} circuit(s)"), global.quiet);
            }
            Ok(())
        }

        CircuitsCommand::Delete { id } => {
            let id = EntityId::new(id);
            let circuit = session.registry.repository().get::<Circuit>(&session.ctx, id)?;
            let prompt = format!("Delete circuit '{}' and its terminations?", circuit.cid);
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            session.registry.inventory().delete_circuit(&session.ctx, id)?;
            session.commit()?;
            output::notice("Circuit deleted", global.quiet);
            Ok(())
        }
    }
}
