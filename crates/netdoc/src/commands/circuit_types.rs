//! Circuit type command handlers.

use std::sync::Arc;

use netdoc_core::{Circuit, CircuitType, NewCircuitType};
use tabled::Tabled;

use crate::cli::{CircuitTypesArgs, CircuitTypesCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CircuitTypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Circuits")]
    circuits: usize,
}

pub fn handle(
    session: &Session,
    args: CircuitTypesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CircuitTypesCommand::List => {
            let types = session
                .registry
                .repository()
                .list::<CircuitType>(&session.ctx, None);
            let store = session.registry.store();
            let out = output::render_list(
                &global.output,
                &types,
                |t: &Arc<CircuitType>| CircuitTypeRow {
                    id: t.id.to_string(),
                    name: t.name.clone(),
                    slug: t.slug.clone(),
                    circuits: store.count_where::<Circuit>(|c| c.type_id == t.id),
                },
                |t| t.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CircuitTypesCommand::Create { name, slug } => {
            let circuit_type = session
                .registry
                .inventory()
                .create_circuit_type(&session.ctx, NewCircuitType { name, slug })?;
            session.commit()?;
            output::print_output(&circuit_type.id.to_string(), global.quiet);
            Ok(())
        }
    }
}
