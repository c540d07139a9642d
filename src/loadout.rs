// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Equipment trees built from resolved entities.
//!
//! After a resolution pass, an entity's default loadout holds one
//! `SItemPortLoadoutEntryParams` per equipped port, with the installed item
//! spliced under it as `InstalledItem`. Ports themselves are declared on the
//! owning record under `SItemPortContainerComponentParams`. Flattening joins
//! the two: every declared port becomes an [`Equipment`] (with or without an
//! item), followed by loadout entries for ports the record does not declare.

use crate::record::Record;

use uuid::Uuid;

const COMPONENTS: &str = "Components";
const PORT_DEFS: &[&str] = &[COMPONENTS, "SItemPortContainerComponentParams", "Ports"];
const DEFAULT_LOADOUT: &[&str] = &[COMPONENTS, "SEntityComponentDefaultLoadoutParams", "loadout"];
const ENTRY: &str = "SItemPortLoadoutEntryParams";
const INSTALLED_ITEM: &str = "InstalledItem";

// Guards against pathological nesting in malformed data.
const MAX_DEPTH: usize = 32;

/// One item port and what is installed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Equipment<'a> {
    pub port_name: &'a str,
    /// Types the port accepts, as declared by its owner.
    pub port_types: Vec<&'a str>,
    pub item: Option<Record<'a>>,
    pub children: Vec<Equipment<'a>>,
}

impl<'a> Equipment<'a> {
    pub fn new(port_name: &'a str) -> Self {
        Self {
            port_name,
            port_types: vec![],
            item: None,
            children: vec![],
        }
    }

    /// Identifier of the installed item.
    pub fn identifier(&self) -> Option<Uuid> {
        self.item?.reference()
    }

    /// Record name of the installed item.
    pub fn type_name(&self) -> Option<&'a str> {
        self.item.map(|i| i.name())
    }

    /// This port and every port below it, depth first.
    pub fn walk(&self) -> Vec<&Equipment<'a>> {
        let mut out = vec![];
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            out.push(e);
            stack.extend(e.children.iter().rev());
        }
        out
    }
}

/// Loadout entries directly under a loadout node, whichever form it takes.
fn loadout_entries<'a>(loadout: Record<'a>) -> Vec<Record<'a>> {
    let mut entries = vec![];
    for params in loadout.children() {
        let list = match params.tag() {
            "SItemPortLoadoutManualParams" => params.child("entries"),
            "SItemPortLoadoutXMLParams" => params.child_path(&["Loadout", "entries"]),
            _ => None,
        };
        if let Some(list) = list {
            entries.extend(list.children_named(ENTRY));
        }
    }
    entries
}

fn declared_ports<'a>(owner: Record<'a>) -> Vec<(&'a str, Vec<&'a str>)> {
    let Some(ports) = owner.child_path(PORT_DEFS) else {
        return vec![];
    };
    ports
        .children_named("SItemPortDef")
        .filter_map(|def| {
            let name = def.raw("Name")?;
            let types: Vec<&'a str> = def
                .child("Types")
                .map(|t| {
                    t.children_named("SItemPortDefTypes")
                        .filter_map(|ty| ty.raw("Type"))
                        .collect()
                })
                .unwrap_or_default();
            Some((name, types))
        })
        .collect()
}

fn build<'a>(owner: Record<'a>, entries: Vec<Record<'a>>, depth: usize) -> Vec<Equipment<'a>> {
    let mut out: Vec<Equipment<'a>> = declared_ports(owner)
        .into_iter()
        .map(|(name, types)| Equipment {
            port_types: types,
            ..Equipment::new(name)
        })
        .collect();

    for entry in entries {
        let Some(port_name) = entry.raw("itemPortName") else {
            continue;
        };
        let item = entry.child(INSTALLED_ITEM);

        let children = if depth + 1 >= MAX_DEPTH {
            vec![]
        } else {
            // Entry-level overrides first, then the item's own defaults.
            let mut nested = entry
                .child("loadout")
                .map(loadout_entries)
                .unwrap_or_default();
            if nested.is_empty() {
                if let Some(default) = item.and_then(|i| i.child_path(DEFAULT_LOADOUT)) {
                    nested = loadout_entries(default);
                }
            }
            match item {
                Some(item) => build(item, nested, depth + 1),
                None => vec![],
            }
        };

        match out.iter_mut().find(|e| e.port_name == port_name && e.item.is_none()) {
            Some(slot) => {
                slot.item = item;
                slot.children = children;
            }
            None => out.push(Equipment {
                item,
                children,
                ..Equipment::new(port_name)
            }),
        }
    }
    out
}

/// Equipment tree of a resolved entity.
pub fn flatten(entity: Record<'_>) -> Vec<Equipment<'_>> {
    let entries = entity
        .child_path(DEFAULT_LOADOUT)
        .map(loadout_entries)
        .unwrap_or_default();
    build(entity, entries, 0)
}
