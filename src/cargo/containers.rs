// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::accumulator::{ContainerFlags, ContainerItem};
use super::Context;
use crate::handlers::file_stem;
use crate::loadout::Equipment;
use crate::path::PathQuery;
use crate::record::{parse_identifier, Record};

use indexmap::IndexSet;

const INVENTORY_TYPE: &str = "inventoryType";
const EXTERNAL_ATTRIBUTE: &str = "isExternalContainer";

fn is_truthy(text: &str) -> bool {
    let text = text.trim();
    text == "1" || text.eq_ignore_ascii_case("true")
}

/// `rear_LEFT` -> `Rear_Left`.
fn title_case(text: &str) -> String {
    text.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// `AEGS_Avenger_Titan` -> `AEGS_Avenger`. Single tokens have no base.
fn trim_last_token(name: &str) -> Option<&str> {
    let pos = name.rfind('_')?;
    let base = name[..pos].trim_end_matches('_');
    if base.contains('_') {
        Some(base)
    } else {
        None
    }
}

impl<'a> Context<'a> {
    /// Classify a container from the element types listed under its
    /// `inventoryType`. Containers that declare neither kind count as open.
    pub fn container_flags(&self, container: Record<'_>) -> ContainerFlags {
        let mut flags = ContainerFlags::empty();
        if let Some(kinds) = container.child(INVENTORY_TYPE) {
            for kind in kinds.children() {
                let tag = kind.tag().to_ascii_lowercase();
                if tag.contains("closed") {
                    flags |= ContainerFlags::CLOSED;
                } else if tag.contains("open") {
                    flags |= ContainerFlags::OPEN;
                }
                if kind.raw(EXTERNAL_ATTRIBUTE).is_some_and(is_truthy) {
                    flags |= ContainerFlags::EXTERNAL;
                }
            }
        }
        if !flags.intersects(ContainerFlags::OPEN | ContainerFlags::CLOSED) {
            flags |= ContainerFlags::OPEN;
        }
        flags
    }

    /// The inventory container of `item`: the item itself if it is one, else
    /// a container spliced under its inventory component, else the one the
    /// component references.
    pub fn inventory_container(&self, item: Record<'a>) -> Option<Record<'a>> {
        let config = self.config();
        let inline = config.inline_container_tag.as_str();
        if item.tag() == inline || item.type_name() == Some(inline) {
            return Some(item);
        }

        let component = self.settings.inventory_component.record(item)?;
        if let Some(spliced) = component.child(inline) {
            return Some(spliced);
        }
        let id = component
            .raw(&config.container_reference_attribute)
            .and_then(parse_identifier)?;
        self.store.resolve_by_identifier(&id)
    }

    /// Describe an item as a container, if it has one with a known capacity.
    pub fn describe(&self, item: Record<'a>) -> Option<ContainerItem> {
        let container = self.inventory_container(item)?;
        let capacity = self.units.units_for(container)?;
        let identifier = match item.reference() {
            Some(id) => id.to_string(),
            None => item.name().to_string(),
        };
        Some(ContainerItem {
            identifier,
            type_name: item.name().to_string(),
            capacity,
            flags: self.container_flags(container),
        })
    }

    pub fn is_template(&self, record: Record<'_>) -> bool {
        let suffix = self.config().template_suffix.to_ascii_lowercase();
        !suffix.is_empty() && record.name().to_ascii_lowercase().ends_with(&suffix)
    }

    /// Describe `record` if it is a usable open container that is not a
    /// template.
    pub fn accepted(&self, record: Record<'a>) -> Option<ContainerItem> {
        if self.is_template(record) {
            return None;
        }
        self.describe(record).filter(|item| item.is_open())
    }

    pub fn is_slot_port(&self, port: &Equipment<'_>) -> bool {
        let config = self.config();
        port.port_name
            .to_ascii_lowercase()
            .contains(&config.slot_keyword.to_ascii_lowercase())
            || port
                .port_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&config.container_attach_type))
    }

    /// Whether `item` attaches as a cargo container.
    pub fn is_container_item(&self, item: Record<'_>) -> bool {
        self.settings
            .attach_type
            .text(item)
            .is_some_and(|t| t.eq_ignore_ascii_case(&self.config().container_attach_type))
    }

    /// Whether `item` is a bulk cargo resource container.
    pub fn is_cargo_resource(&self, item: Record<'_>) -> bool {
        let config = self.config();
        let matches = |path: &PathQuery, expected: &str| {
            path.text(item)
                .is_some_and(|t| t.eq_ignore_ascii_case(expected))
        };
        matches(&self.settings.attach_type, &config.cargo_resource_type)
            && matches(&self.settings.attach_subtype, &config.cargo_resource_subtype)
    }

    pub fn bulk_capacity(&self, item: Record<'_>) -> Option<f64> {
        self.settings.bulk_capacity.number(item)
    }

    /// The first positive hardcoded capacity on the entity.
    pub fn fallback_capacity(&self) -> Option<f64> {
        self.settings
            .fallback_capacity
            .iter()
            .filter_map(|path| path.number(self.entity))
            .find(|n| *n > 0.0)
    }

    fn base_definition(&self) -> Option<&'a str> {
        self.settings
            .base_definition
            .text(self.entity)
            .and_then(file_stem)
    }

    /// Names the entity is likely derived from: its name with trailing
    /// tokens trimmed, and the stem of its base vehicle definition. Never
    /// contains the entity's own name.
    pub fn base_type_names(&self) -> IndexSet<String> {
        let own = self.entity.name();
        let mut names = IndexSet::new();
        let mut current = own;
        while let Some(base) = trim_last_token(current) {
            names.insert(base.to_string());
            current = base;
        }
        if let Some(stem) = self.base_definition() {
            names.insert(stem.to_string());
        }
        names.retain(|n: &String| !n.eq_ignore_ascii_case(own));
        names
    }

    /// `<base>_<modification>` for entities that are variants of a base
    /// definition.
    pub fn variant_stem(&self) -> Option<String> {
        let modification = self.settings.variant.text(self.entity)?.trim();
        if modification.is_empty() {
            return None;
        }
        let base = self.base_definition()?;
        Some(format!("{base}_{modification}"))
    }

    /// Slot suffixes scraped from container port names:
    /// `hardpoint_cargogrid_rear_left` -> `Rear_Left`.
    pub fn port_suffixes(&self) -> IndexSet<String> {
        self.ports()
            .into_iter()
            .filter_map(|port| {
                let caps = self.settings.slot_suffix.captures(port.port_name)?;
                let suffix = title_case(caps.get(1)?.as_str());
                if suffix.is_empty() {
                    None
                } else {
                    Some(suffix)
                }
            })
            .collect()
    }

    /// Record names to try by convention, most specific stem first.
    pub fn convention_names(&self) -> IndexSet<String> {
        let keyword = &self.config().container_keyword;
        let mut stems: IndexSet<String> = IndexSet::new();
        if let Some(variant) = self.variant_stem() {
            stems.insert(variant);
        }
        stems.insert(self.entity.name().to_string());
        stems.extend(self.base_type_names());

        let suffixes = self.port_suffixes();
        let mut names = IndexSet::new();
        for stem in &stems {
            names.insert(format!("{stem}_{keyword}"));
            for suffix in &suffixes {
                names.insert(format!("{stem}_{keyword}_{suffix}"));
            }
        }
        names
    }
}
