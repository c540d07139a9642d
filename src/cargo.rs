// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cargo capacity aggregation.
//!
//! Capacity data in the records is scattered and often incomplete, so it is
//! derived by a fixed sequence of strategies, from most to least reliable:
//!
//! ```text
//! 1 equipment tree       installed CargoGrid items; sets expected slots
//! 2 convention naming    <stem>_CargoGrid[_<Suffix>] by name
//! 3 prefix scan          <entity>_CargoGrid_* by capacity
//! 4 base prefix scan     <base>_CargoGrid_* for inferred base names
//! 5 bulk capacity        cargo resource containers (always runs)
//! 6 direct reference     entity's own inventory component (total == 0)
//! 7 fallback             hardcoded capacity attribute (total == 0)
//! ```
//!
//! All strategies share one [`Accumulator`]. Strategies 1-4 only run while
//! [`Accumulator::should_continue_searching`] holds, so once the expected
//! slots are filled with positive capacity the search stops.

mod accumulator;
mod containers;
mod strategies;

pub use accumulator::{Accumulator, ContainerFlags, ContainerItem, StrategyRun};
pub use strategies::{
    default_strategies, BaseClassPrefixScan, BulkCapacity, ConventionNaming, DirectReference,
    EquipmentTree, Fallback, PrefixScan,
};

use crate::config::AggregationConfig;
use crate::loadout::Equipment;
use crate::path::PathQuery;
use crate::record::Record;
use crate::store::RecordStore;
use crate::units::{UnitCalculator, UnitPaths};

use anyhow::Result;
use log::{debug, trace};
use regex::Regex;

/// [`AggregationConfig`] with its paths and patterns compiled.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: AggregationConfig,
    attach_type: PathQuery,
    attach_subtype: PathQuery,
    inventory_component: PathQuery,
    bulk_capacity: PathQuery,
    variant: PathQuery,
    base_definition: PathQuery,
    fallback_capacity: Vec<PathQuery>,
    slot_suffix: Regex,
    units: UnitPaths,
}

impl Settings {
    pub fn compile(config: &AggregationConfig) -> Result<Self> {
        let slot_suffix = Regex::new(&format!(
            "(?i){}_*(.*)$",
            regex::escape(&config.slot_keyword)
        ))?;
        Ok(Self {
            attach_type: PathQuery::parse(&config.attach_type_path)?,
            attach_subtype: PathQuery::parse(&config.attach_subtype_path)?,
            inventory_component: PathQuery::parse(&config.inventory_component_path)?,
            bulk_capacity: PathQuery::parse(&config.bulk_capacity_path)?,
            variant: PathQuery::parse(&config.variant_path)?,
            base_definition: PathQuery::parse(&config.base_definition_path)?,
            fallback_capacity: config
                .fallback_capacity_paths
                .iter()
                .map(|p| PathQuery::parse(p))
                .collect::<Result<_, _>>()?,
            slot_suffix,
            units: UnitPaths::compile(&config.units)?,
            config: config.clone(),
        })
    }
}

/// Everything a strategy may look at for one entity.
pub struct Context<'a> {
    entity: Record<'a>,
    equipment: &'a [Equipment<'a>],
    store: &'a dyn RecordStore,
    settings: &'a Settings,
    units: UnitCalculator<'a>,
}

impl<'a> Context<'a> {
    pub fn new(
        entity: Record<'a>,
        equipment: &'a [Equipment<'a>],
        store: &'a dyn RecordStore,
        settings: &'a Settings,
    ) -> Self {
        Self {
            entity,
            equipment,
            store,
            settings,
            units: UnitCalculator::new(store, &settings.units),
        }
    }

    pub fn entity(&self) -> Record<'a> {
        self.entity
    }

    pub fn equipment(&self) -> &'a [Equipment<'a>] {
        self.equipment
    }

    pub fn store(&self) -> &'a dyn RecordStore {
        self.store
    }

    pub fn config(&self) -> &'a AggregationConfig {
        &self.settings.config
    }

    pub fn units(&self) -> &UnitCalculator<'a> {
        &self.units
    }

    /// Every port of the equipment tree, depth first.
    pub fn ports(&self) -> Vec<&'a Equipment<'a>> {
        self.equipment.iter().flat_map(|e| e.walk()).collect()
    }
}

/// One step of the aggregation pipeline.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Whether the strategy runs at all given the state left by earlier ones.
    fn gate(&self, acc: &Accumulator) -> bool {
        acc.should_continue_searching()
    }

    fn resolve(&self, ctx: &Context<'_>, acc: &mut Accumulator);
}

/// Runs the strategies in order against one accumulator per entity.
pub struct Pipeline<'s> {
    store: &'s dyn RecordStore,
    settings: Settings,
    strategies: Vec<Box<dyn Strategy>>,
}

impl<'s> Pipeline<'s> {
    /// Pipeline with the standard seven strategies.
    pub fn new(store: &'s dyn RecordStore, config: &AggregationConfig) -> Result<Self> {
        Ok(Self {
            store,
            settings: Settings::compile(config)?,
            strategies: default_strategies(),
        })
    }

    /// Replace the strategy list.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Derive the cargo capacity of `entity` from its equipment tree and the
    /// store.
    pub fn aggregate(&self, entity: Record<'_>, equipment: &[Equipment<'_>]) -> Accumulator {
        let ctx = Context::new(entity, equipment, self.store, &self.settings);
        let mut acc = Accumulator::new();

        for strategy in &self.strategies {
            if !strategy.gate(&acc) {
                trace!("{}: skipping {}", entity.name(), strategy.name());
                continue;
            }
            let items_before = acc.items().len();
            let total_before = acc.total_capacity();
            strategy.resolve(&ctx, &mut acc);
            acc.record_run(strategy.name(), items_before, total_before);
        }

        debug!(
            "{}: cargo capacity {} from {} containers (expected slots {:?}, satisfied {})",
            entity.name(),
            acc.total_capacity(),
            acc.items().len(),
            acc.expected_slots(),
            acc.is_satisfied()
        );
        acc
    }
}
