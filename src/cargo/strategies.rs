// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::accumulator::{Accumulator, ContainerItem};
use super::{Context, Strategy};
use crate::loadout::Equipment;

use log::{debug, trace};

/// How many containers a search strategy may still add: the open slots when
/// the slot count is known, else one.
fn local_cap(acc: &Accumulator) -> u32 {
    match acc.expected_slots() {
        Some(_) => acc.remaining_slots(),
        None => 1,
    }
}

/// Add candidates in order until the local cap is reached. Returns the
/// number added.
fn add_capped(acc: &mut Accumulator, candidates: Vec<ContainerItem>) -> u32 {
    let cap = local_cap(acc);
    let mut added = 0;
    for item in candidates {
        if added >= cap {
            break;
        }
        let name = item.type_name.clone();
        if acc.add_container(item) {
            trace!("added container `{name}`");
            added += 1;
        }
    }
    added
}

/// Sort by descending capacity. Ties keep their order.
fn rank(items: &mut [ContainerItem]) {
    items.sort_by(|a, b| b.capacity.total_cmp(&a.capacity));
}

fn prefix_candidates(ctx: &Context<'_>, stem: &str) -> Vec<ContainerItem> {
    let prefix = format!("{stem}_{}_", ctx.config().container_keyword);
    let mut items: Vec<ContainerItem> = ctx
        .store()
        .find_by_type_prefix(&prefix)
        .into_iter()
        .filter_map(|record| ctx.accepted(record))
        .collect();
    rank(&mut items);
    debug!("{} candidates for prefix `{prefix}`", items.len());
    items
}

/// Ports of the equipment tree with their `/`-joined paths, depth first.
fn port_paths<'e, 'a>(equipment: &'e [Equipment<'a>]) -> Vec<(String, &'e Equipment<'a>)> {
    let mut out = vec![];
    let mut stack: Vec<(String, &Equipment)> = equipment
        .iter()
        .rev()
        .map(|e| (e.port_name.to_string(), e))
        .collect();
    while let Some((path, port)) = stack.pop() {
        stack.extend(
            port.children
                .iter()
                .rev()
                .map(|c| (format!("{path}/{}", c.port_name), c)),
        );
        out.push((path, port));
    }
    out
}

/// Containers installed in the entity's equipment tree. Each installation
/// counts on its own, so two ports holding the same grid add up.
pub struct EquipmentTree;

impl Strategy for EquipmentTree {
    fn name(&self) -> &'static str {
        "equipment-tree"
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        let mut slots = 0u32;
        for (path, port) in port_paths(ctx.equipment()) {
            if ctx.is_slot_port(port) {
                slots += 1;
            }
            let Some(item) = port.item else {
                continue;
            };
            if !ctx.is_container_item(item) {
                continue;
            }
            match ctx.describe(item) {
                Some(container) => {
                    acc.add_installed(&path, container);
                }
                None => debug!("{path}: no capacity for `{}`", item.name()),
            }
        }
        if slots > 0 {
            acc.set_expected_slots(slots);
        }
    }
}

/// Containers found by naming convention: `<stem>_CargoGrid[_<Suffix>]`.
pub struct ConventionNaming;

impl Strategy for ConventionNaming {
    fn name(&self) -> &'static str {
        "convention-naming"
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        let candidates = ctx
            .convention_names()
            .iter()
            .filter_map(|name| ctx.store().resolve_by_type_name(name))
            .filter_map(|record| ctx.accepted(record))
            .collect();
        add_capped(acc, candidates);
    }
}

/// Containers whose name starts with `<entity>_CargoGrid_`, largest first.
pub struct PrefixScan;

impl Strategy for PrefixScan {
    fn name(&self) -> &'static str {
        "prefix-scan"
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        add_capped(acc, prefix_candidates(ctx, ctx.entity().name()));
    }
}

/// As [`PrefixScan`], for each name the entity appears to derive from.
pub struct BaseClassPrefixScan;

impl Strategy for BaseClassPrefixScan {
    fn name(&self) -> &'static str {
        "base-prefix-scan"
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        let candidates = ctx
            .base_type_names()
            .iter()
            .flat_map(|base| prefix_candidates(ctx, base))
            .collect();
        add_capped(acc, candidates);
    }
}

/// Capacity of installed cargo resource containers. Always runs and never
/// registers containers.
pub struct BulkCapacity;

impl Strategy for BulkCapacity {
    fn name(&self) -> &'static str {
        "bulk-capacity"
    }

    fn gate(&self, _acc: &Accumulator) -> bool {
        true
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        for port in ctx.ports() {
            let Some(item) = port.item else {
                continue;
            };
            if !ctx.is_cargo_resource(item) {
                continue;
            }
            if let Some(capacity) = ctx.bulk_capacity(item) {
                trace!("{}: bulk capacity {capacity}", port.port_name);
                acc.add_capacity(capacity);
            }
        }
    }
}

/// The container referenced by the entity's own inventory component.
pub struct DirectReference;

impl Strategy for DirectReference {
    fn name(&self) -> &'static str {
        "direct-reference"
    }

    fn gate(&self, acc: &Accumulator) -> bool {
        acc.total_capacity() <= 0.0
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        let entity = ctx.entity();
        let Some(container) = ctx.inventory_container(entity) else {
            return;
        };
        if ctx.is_template(container) {
            debug!("{}: skipping template `{}`", entity.name(), container.name());
            return;
        }
        let Some(capacity) = ctx.units().units_for(container) else {
            return;
        };
        let identifier = match container.reference() {
            Some(id) => id.to_string(),
            None => container.name().to_string(),
        };
        acc.add_container(ContainerItem {
            identifier,
            type_name: container.name().to_string(),
            capacity,
            flags: ctx.container_flags(container),
        });
    }
}

/// Hardcoded capacity on the entity.
pub struct Fallback;

impl Strategy for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn gate(&self, acc: &Accumulator) -> bool {
        acc.total_capacity() <= 0.0
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator) {
        if let Some(capacity) = ctx.fallback_capacity() {
            acc.set_total(capacity);
        }
    }
}

/// The seven strategies, most reliable first.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(EquipmentTree),
        Box::new(ConventionNaming),
        Box::new(PrefixScan),
        Box::new(BaseClassPrefixScan),
        Box::new(BulkCapacity),
        Box::new(DirectReference),
        Box::new(Fallback),
    ]
}
