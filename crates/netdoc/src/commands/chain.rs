//! Selection chain command handlers.

use std::fmt::Write as _;

use netdoc_core::{
    ChainField, ChainResolver, Device, EntityId, Interface, Rack, SelectOption, Selections, Site,
};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ChainArgs, ChainCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
}

#[derive(Clone, Serialize, Tabled)]
struct TemplateRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Query")]
    query: String,
}

fn parse_field(raw: &str) -> Result<ChainField, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "field".into(),
        reason: format!("expected site, rack, device or interface, got '{raw}'"),
    })
}

fn selections(site: Option<u64>, rack: Option<u64>, device: Option<u64>) -> Selections {
    let mut selections = Selections::new();
    for (field, id) in [
        (ChainField::Site, site),
        (ChainField::Rack, rack),
        (ChainField::Device, device),
    ] {
        if let Some(id) = id {
            selections.set(field, EntityId::new(id));
        }
    }
    selections
}

fn selection_label(session: &Session, field: ChainField, id: EntityId) -> String {
    let store = session.registry.store();
    match field {
        ChainField::Site => util::label_of::<Site>(store, Some(id)),
        ChainField::Rack => util::label_of::<Rack>(store, Some(id)),
        ChainField::Device => util::label_of::<Device>(store, Some(id)),
        ChainField::Interface => util::label_of::<Interface>(store, Some(id)),
    }
}

pub fn handle(session: &Session, args: ChainArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolver = session.registry.chain();
    match args.command {
        ChainCommand::Resolve {
            field,
            site,
            rack,
            device,
            editing,
        } => {
            let field = parse_field(&field)?;
            let options = resolver.resolve(
                &session.ctx,
                &field.to_string(),
                &selections(site, rack, device),
                editing.map(EntityId::new),
            );
            let out = output::render_list(
                &global.output,
                &options,
                |o: &SelectOption| OptionRow {
                    id: o.id.to_string(),
                    label: o.label.clone(),
                    disabled: if o.disabled { "yes".into() } else { String::new() },
                },
                |o| o.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChainCommand::Seed { id } => {
            let seeded = resolver.seed(&session.ctx, EntityId::new(id))?;
            let out = output::render_single(
                &global.output,
                &seeded,
                |s| {
                    let mut out = String::new();
                    for (field, id) in s.iter() {
                        let label = selection_label(session, field, id);
                        let _ = writeln!(out, "{field:<10} {id} ({label})");
                    }
                    out.trim_end().to_owned()
                },
                |s| {
                    s.iter()
                        .map(|(field, id)| format!("{field}={id}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChainCommand::Templates => {
            let rows: Vec<TemplateRow> = ChainResolver::templates()
                .map(|(link, query)| TemplateRow {
                    field: link.field.to_string(),
                    endpoint: link.endpoint.into(),
                    query,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                TemplateRow::clone,
                |r| format!("{}\t{}", r.field, r.query),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
