// ── Dependent-selection chain ──
//
// Site → rack → device → interface. Each field's options are narrowed by
// the fields before it. The chain itself is a static table; the resolver
// reads the table to find a field's parents and the client reads it to
// build its lookup queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::access::{CallerContext, Repository};
use crate::error::Result;
use crate::model::{CircuitTermination, Device, EntityId, Interface, Rack, Site};
use crate::store::{DataStore, Record};
use crate::termination::TerminationEngine;
use crate::util::natural_cmp;

/// A selection field of the endpoint chain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainField {
    Site,
    Rack,
    Device,
    Interface,
}

// ── Chain table ──────────────────────────────────────────────────────

/// One parent a field's options are filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParent {
    /// Query parameter the parent's id is passed as.
    pub param: &'static str,
    pub field: ChainField,
    /// Without a required parent the field has no options.
    pub required: bool,
}

/// Definition of one chain field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    pub field: ChainField,
    pub parents: &'static [ChainParent],
    /// Lookup endpoint the client queries for options.
    pub endpoint: &'static str,
    pub static_filters: &'static [(&'static str, &'static str)],
    /// Attribute used as the option label.
    pub display_field: &'static str,
    /// Attribute marking an option as taken.
    pub disabled_indicator: Option<&'static str>,
}

pub static CHAIN: [ChainLink; 4] = [
    ChainLink {
        field: ChainField::Site,
        parents: &[],
        endpoint: "/api/dcim/sites/",
        static_filters: &[],
        display_field: "name",
        disabled_indicator: None,
    },
    ChainLink {
        field: ChainField::Rack,
        parents: &[ChainParent {
            param: "site_id",
            field: ChainField::Site,
            required: true,
        }],
        endpoint: "/api/dcim/racks/",
        static_filters: &[],
        display_field: "name",
        disabled_indicator: None,
    },
    ChainLink {
        field: ChainField::Device,
        parents: &[
            ChainParent {
                param: "site_id",
                field: ChainField::Site,
                required: true,
            },
            ChainParent {
                param: "rack_id",
                field: ChainField::Rack,
                required: false,
            },
        ],
        endpoint: "/api/dcim/devices/",
        static_filters: &[],
        display_field: "display_name",
        disabled_indicator: None,
    },
    ChainLink {
        field: ChainField::Interface,
        parents: &[ChainParent {
            param: "device_id",
            field: ChainField::Device,
            required: true,
        }],
        endpoint: "/api/dcim/interfaces/",
        static_filters: &[("type", "physical")],
        display_field: "name",
        disabled_indicator: Some("is_connected"),
    },
];

impl ChainLink {
    pub fn of(field: ChainField) -> &'static ChainLink {
        match field {
            ChainField::Site => &CHAIN[0],
            ChainField::Rack => &CHAIN[1],
            ChainField::Device => &CHAIN[2],
            ChainField::Interface => &CHAIN[3],
        }
    }

    /// Query template with `{{field}}` placeholders, e.g.
    /// `site_id={{site}}&rack_id={{rack}}`.
    pub fn filter_template(&self) -> String {
        self.parents
            .iter()
            .map(|p| format!("{}={{{{{}}}}}", p.param, p.field))
            .chain(self.static_filters.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Concrete query for the current selections. Unselected optional
    /// parents are left out; `None` if a required parent is missing.
    pub fn render_query(&self, selections: &Selections) -> Option<String> {
        let mut pairs = Vec::new();
        for parent in self.parents {
            match selections.get(parent.field) {
                Some(id) => pairs.push(format!("{}={id}", parent.param)),
                None if parent.required => return None,
                None => {}
            }
        }
        pairs.extend(self.static_filters.iter().map(|(k, v)| format!("{k}={v}")));
        Some(pairs.join("&"))
    }
}

// ── Selections and options ───────────────────────────────────────────

/// Parent choices made so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections(BTreeMap<ChainField, EntityId>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: ChainField, id: EntityId) -> Self {
        self.set(field, id);
        self
    }

    pub fn set(&mut self, field: ChainField, id: EntityId) {
        self.0.insert(field, id);
    }

    pub fn get(&self, field: ChainField) -> Option<EntityId> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChainField, EntityId)> + '_ {
        self.0.iter().map(|(f, id)| (*f, *id))
    }
}

/// One choice for a chain field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: EntityId,
    pub label: String,
    pub disabled: bool,
}

impl SelectOption {
    fn enabled<T: Record>(record: &T) -> Self {
        Self {
            id: record.id(),
            label: record.label(),
            disabled: false,
        }
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub struct ChainResolver<'a> {
    repo: Repository<'a>,
    engine: TerminationEngine<'a>,
}

impl<'a> ChainResolver<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            repo: Repository::new(store),
            engine: TerminationEngine::new(store),
        }
    }

    /// Options for `field` given the parent selections.
    ///
    /// Unknown fields, missing required parents, and parents that do not
    /// exist or are hidden from the caller all yield an empty list.
    /// `editing` is the termination being edited: its own interface stays
    /// selectable even though it is connected.
    pub fn resolve(
        &self,
        ctx: &CallerContext,
        field: &str,
        selections: &Selections,
        editing: Option<EntityId>,
    ) -> Vec<SelectOption> {
        let Ok(field) = field.parse::<ChainField>() else {
            debug!(field, "unknown chain field");
            return Vec::new();
        };
        let link = ChainLink::of(field);

        for parent in link.parents {
            match selections.get(parent.field) {
                Some(id) if !self.parent_visible(ctx, parent.field, id) => {
                    debug!(%field, parent = %parent.field, %id, "parent not visible");
                    return Vec::new();
                }
                None if parent.required => return Vec::new(),
                _ => {}
            }
        }

        let mut options = match field {
            ChainField::Site => self
                .repo
                .list::<Site>(ctx, None)
                .iter()
                .map(|s| SelectOption::enabled::<Site>(s))
                .collect(),
            ChainField::Rack => self.racks(ctx, selections),
            ChainField::Device => self.devices(ctx, selections),
            ChainField::Interface => self.interfaces(ctx, selections, editing),
        };
        options.sort_by(|a, b| natural_cmp(&a.label, &b.label).then_with(|| a.id.cmp(&b.id)));

        debug!(%field, count = options.len(), user = %ctx.username, "resolved chain field");
        options
    }

    fn parent_visible(&self, ctx: &CallerContext, field: ChainField, id: EntityId) -> bool {
        match field {
            ChainField::Site => self.repo.find::<Site>(ctx, id).is_some(),
            ChainField::Rack => self.repo.find::<Rack>(ctx, id).is_some(),
            ChainField::Device => self.repo.find::<Device>(ctx, id).is_some(),
            ChainField::Interface => self.repo.find::<Interface>(ctx, id).is_some(),
        }
    }

    fn racks(&self, ctx: &CallerContext, selections: &Selections) -> Vec<SelectOption> {
        let Some(site) = selections.get(ChainField::Site) else {
            return Vec::new();
        };
        self.repo
            .list_where::<Rack>(ctx, |r| r.site_id == site)
            .iter()
            .map(|r| SelectOption::enabled::<Rack>(r))
            .collect()
    }

    fn devices(&self, ctx: &CallerContext, selections: &Selections) -> Vec<SelectOption> {
        let Some(site) = selections.get(ChainField::Site) else {
            return Vec::new();
        };
        let rack = selections.get(ChainField::Rack);
        self.repo
            .list_where::<Device>(ctx, |d| {
                d.site_id == site && rack.is_none_or(|r| d.rack_id == Some(r))
            })
            .iter()
            .map(|d| SelectOption::enabled::<Device>(d))
            .collect()
    }

    fn interfaces(
        &self,
        ctx: &CallerContext,
        selections: &Selections,
        editing: Option<EntityId>,
    ) -> Vec<SelectOption> {
        let Some(device) = selections.get(ChainField::Device) else {
            return Vec::new();
        };
        let assigned = editing
            .and_then(|t| self.repo.find::<CircuitTermination>(ctx, t))
            .and_then(|t| t.interface_id);

        self.repo
            .list_where::<Interface>(ctx, |i| i.device_id == device && i.is_connectable())
            .iter()
            .map(|i| SelectOption {
                id: i.id,
                label: i.name.clone(),
                disabled: self.engine.is_interface_connected(i.id) && Some(i.id) != assigned,
            })
            .collect()
    }

    /// Initial selections for editing an existing termination.
    pub fn seed(&self, ctx: &CallerContext, termination: EntityId) -> Result<Selections> {
        let termination = self.repo.get::<CircuitTermination>(ctx, termination)?;
        let mut selections = Selections::new().with(ChainField::Site, termination.site_id);

        let interface: Option<Arc<Interface>> = termination
            .interface_id
            .and_then(|id| self.repo.find::<Interface>(ctx, id));
        if let Some(interface) = interface {
            if let Some(device) = self.repo.find::<Device>(ctx, interface.device_id) {
                if let Some(rack) = device.rack_id {
                    selections.set(ChainField::Rack, rack);
                }
                selections.set(ChainField::Device, device.id);
            }
            selections.set(ChainField::Interface, interface.id);
        }
        Ok(selections)
    }

    /// Every chain field with its query template.
    pub fn templates() -> impl Iterator<Item = (&'static ChainLink, String)> {
        ChainField::iter().map(|f| {
            let link = ChainLink::of(f);
            (link, link.filter_template())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use pretty_assertions::assert_eq;

    fn labels(options: &[SelectOption]) -> Vec<&str> {
        options.iter().map(|o| o.label.as_str()).collect()
    }

    #[test]
    fn templates_render_from_the_table() {
        let rendered: Vec<_> = ChainResolver::templates()
            .map(|(link, template)| (link.field.to_string(), template))
            .collect();
        assert_eq!(
            rendered,
            [
                ("site".to_owned(), String::new()),
                ("rack".to_owned(), "site_id={{site}}".to_owned()),
                ("device".to_owned(), "site_id={{site}}&rack_id={{rack}}".to_owned()),
                ("interface".to_owned(), "device_id={{device}}&type=physical".to_owned()),
            ]
        );
    }

    #[test]
    fn render_query_skips_optional_parents() {
        let link = ChainLink::of(ChainField::Device);
        let site_only = Selections::new().with(ChainField::Site, EntityId::new(4));
        assert_eq!(link.render_query(&site_only).unwrap(), "site_id=4");
        assert_eq!(
            link.render_query(&site_only.clone().with(ChainField::Rack, EntityId::new(9)))
                .unwrap(),
            "site_id=4&rack_id=9"
        );
        assert_eq!(link.render_query(&Selections::new()), None);
    }

    #[test]
    fn racks_are_filtered_by_site() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let dc1 = Selections::new().with(ChainField::Site, fx.dc1);

        let options = resolver.resolve(&fx.admin(), "rack", &dc1, None);
        assert_eq!(labels(&options), ["R1", "R2"]);
        assert!(options.iter().all(|o| !o.disabled));

        assert!(resolver.resolve(&fx.admin(), "rack", &Selections::new(), None).is_empty());
    }

    #[test]
    fn devices_narrow_by_optional_rack() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let dc1 = Selections::new().with(ChainField::Site, fx.dc1);

        let all = resolver.resolve(&fx.admin(), "device", &dc1, None);
        assert_eq!(labels(&all), ["MX480 (AST-0042)", "core-1", "edge-1", "edge-2"]);

        let in_r1 = resolver.resolve(
            &fx.admin(),
            "device",
            &dc1.clone().with(ChainField::Rack, fx.dc1_r1),
            None,
        );
        // Unnamed devices are offered by model and asset tag.
        assert_eq!(labels(&in_r1), ["MX480 (AST-0042)", "edge-1"]);
    }

    #[test]
    fn interfaces_are_connectable_only_and_flag_connected() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let edge1 = Selections::new().with(ChainField::Device, fx.edge1);

        let options = resolver.resolve(&fx.admin(), "interface", &edge1, None);
        assert_eq!(
            labels(&options),
            ["xe-0/0/0", "xe-0/0/1", "xe-0/0/2", "xe-0/0/10"]
        );
        let disabled: Vec<_> = options.iter().filter(|o| o.disabled).map(|o| o.id).collect();
        assert_eq!(disabled, [fx.xe2]);
    }

    #[test]
    fn edited_termination_keeps_its_own_interface_enabled() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let term = fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));
        let edge1 = Selections::new().with(ChainField::Device, fx.edge1);

        let fresh = resolver.resolve(&fx.admin(), "interface", &edge1, None);
        assert!(fresh.iter().find(|o| o.id == fx.xe0).unwrap().disabled);

        let editing = resolver.resolve(&fx.admin(), "interface", &edge1, Some(term));
        assert!(!editing.iter().find(|o| o.id == fx.xe0).unwrap().disabled);
        assert!(editing.iter().find(|o| o.id == fx.xe2).unwrap().disabled);
    }

    #[test]
    fn unknown_field_and_hidden_parent_yield_nothing() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        assert!(
            resolver
                .resolve(&fx.admin(), "vlan", &Selections::new(), None)
                .is_empty()
        );

        let hidden = Selections::new().with(ChainField::Site, fx.globex_site);
        assert!(resolver.resolve(&fx.acme(), "rack", &hidden, None).is_empty());
        assert!(resolver.resolve(&fx.acme(), "device", &hidden, None).is_empty());

        let missing = Selections::new().with(ChainField::Site, EntityId::new(9_999));
        assert!(resolver.resolve(&fx.admin(), "rack", &missing, None).is_empty());
    }

    #[test]
    fn site_root_lists_visible_sites() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let acme = resolver.resolve(&fx.acme(), "site", &Selections::new(), None);
        assert_eq!(labels(&acme), ["DC1", "DC2"]);
        let admin = resolver.resolve(&fx.admin(), "site", &Selections::new(), None);
        assert_eq!(labels(&admin), ["DC1", "DC2", "Globex HQ"]);
    }

    #[test]
    fn seed_walks_up_from_the_interface() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let term = fx.terminate(fx.c1, "A", fx.dc1, Some(fx.xe0));

        let seeded = resolver.seed(&fx.admin(), term).unwrap();
        assert_eq!(seeded.get(ChainField::Site), Some(fx.dc1));
        assert_eq!(seeded.get(ChainField::Rack), Some(fx.dc1_r1));
        assert_eq!(seeded.get(ChainField::Device), Some(fx.edge1));
        assert_eq!(seeded.get(ChainField::Interface), Some(fx.xe0));

        let bare = fx.terminate(fx.c1, "Z", fx.dc2, None);
        let seeded = resolver.seed(&fx.admin(), bare).unwrap();
        assert_eq!(seeded.iter().collect::<Vec<_>>(), [(ChainField::Site, fx.dc2)]);
    }
}
