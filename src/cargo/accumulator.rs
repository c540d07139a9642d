// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::serialize_number;

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Serialize, Serializer};

bitflags! {
    /// Classification of an inventory container.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
    pub struct ContainerFlags: u8 {
        const OPEN = 1;
        const EXTERNAL = 1 << 1;
        const CLOSED = 1 << 2;
    }
}

fn serialize_capacity<S>(n: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serialize_number(*n, serializer)
}

/// A container discovered while aggregating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerItem {
    /// Stable identifier used for deduplication.
    pub identifier: String,
    pub type_name: String,
    #[serde(serialize_with = "serialize_capacity")]
    pub capacity: f64,
    pub flags: ContainerFlags,
}

impl ContainerItem {
    pub fn is_open(&self) -> bool {
        self.flags.contains(ContainerFlags::OPEN)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(ContainerFlags::EXTERNAL)
    }

    pub fn is_closed(&self) -> bool {
        self.flags.contains(ContainerFlags::CLOSED)
    }
}

/// What one strategy contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRun {
    pub strategy: &'static str,
    pub items_added: usize,
    #[serde(serialize_with = "serialize_capacity")]
    pub capacity_added: f64,
    #[serde(serialize_with = "serialize_capacity")]
    pub total_after: f64,
    pub remaining_after: u32,
}

/// Per-entity aggregation state, threaded through the strategies in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Accumulator {
    #[serde(serialize_with = "serialize_capacity")]
    total_capacity: f64,
    items: Vec<ContainerItem>,
    #[serde(skip)]
    seen: HashSet<String>,
    /// Identifiers of container classes installed in the equipment tree.
    #[serde(skip)]
    installed: HashSet<String>,
    expected_slots: Option<u32>,
    remaining_slots: u32,
    runs: Vec<StrategyRun>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_capacity(&self) -> f64 {
        self.total_capacity
    }

    pub fn items(&self) -> &[ContainerItem] {
        &self.items
    }

    pub fn has_seen(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether a container of this class is installed in the entity.
    pub fn is_installed(&self, identifier: &str) -> bool {
        self.installed.contains(identifier)
    }

    pub fn expected_slots(&self) -> Option<u32> {
        self.expected_slots
    }

    pub fn remaining_slots(&self) -> u32 {
        self.remaining_slots
    }

    /// Strategies whose gate was open, in execution order.
    pub fn runs(&self) -> &[StrategyRun] {
        &self.runs
    }

    pub fn should_continue_searching(&self) -> bool {
        self.expected_slots.is_none() || self.total_capacity <= 0.0 || self.remaining_slots > 0
    }

    pub fn is_satisfied(&self) -> bool {
        self.expected_slots.is_some() && self.total_capacity > 0.0 && self.remaining_slots == 0
    }

    /// Fix the number of expected container slots. Only the first call has
    /// an effect; returns whether this call set it.
    pub fn set_expected_slots(&mut self, slots: u32) -> bool {
        if self.expected_slots.is_some() {
            return false;
        }
        self.expected_slots = Some(slots);
        let found = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.remaining_slots = slots.saturating_sub(found);
        true
    }

    /// Register a container unless its identifier was seen before or names
    /// a class that is already installed.
    pub fn add_container(&mut self, item: ContainerItem) -> bool {
        if self.seen.contains(&item.identifier) || self.installed.contains(&item.identifier) {
            return false;
        }
        self.insert(item);
        true
    }

    /// Register a container installed at `port_path`. Every installation
    /// counts, even when several ports hold the same class; the class
    /// identifier is remembered so searches do not add it again.
    pub fn add_installed(&mut self, port_path: &str, mut item: ContainerItem) -> bool {
        let identifier = format!("{port_path}:{}", item.identifier);
        if self.seen.contains(&identifier) {
            return false;
        }
        self.installed.insert(std::mem::replace(&mut item.identifier, identifier));
        self.insert(item);
        true
    }

    fn insert(&mut self, item: ContainerItem) {
        self.seen.insert(item.identifier.clone());
        self.total_capacity += item.capacity.max(0.0);
        self.remaining_slots = self.remaining_slots.saturating_sub(1);
        self.items.push(item);
    }

    /// Add capacity that is not tied to a slot.
    pub fn add_capacity(&mut self, amount: f64) {
        if amount > 0.0 {
            self.total_capacity += amount;
        }
    }

    /// Set the total when nothing else was found. Returns whether it did.
    pub fn set_total(&mut self, total: f64) -> bool {
        if self.total_capacity > 0.0 || total <= 0.0 {
            return false;
        }
        self.total_capacity = total;
        true
    }

    pub(crate) fn record_run(
        &mut self,
        strategy: &'static str,
        items_before: usize,
        total_before: f64,
    ) {
        self.runs.push(StrategyRun {
            strategy,
            items_added: self.items.len() - items_before,
            capacity_added: self.total_capacity - total_before,
            total_after: self.total_capacity,
            remaining_after: self.remaining_slots,
        });
    }
}
