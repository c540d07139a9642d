// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::cargo::{Accumulator, ContainerItem, Pipeline, StrategyRun};
use crate::config::Config;
use crate::document::Document;
use crate::loadout;
use crate::record::Record;
use crate::resolver::{PassStats, Resolver};
use crate::store::RecordStore;
use crate::value::serialize_number;

use anyhow::{anyhow, Result};
use log::info;
use serde::{Serialize, Serializer};

const MANUFACTURER_PATHS: &[&str] = &[
    "Components/SAttachableComponentParams/AttachDef/Manufacturer",
    "Components/VehicleComponentParams/Manufacturer",
];

fn serialize_capacity<S>(n: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serialize_number(*n, serializer)
}

/// Derived cargo document of one entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(serialize_with = "serialize_capacity")]
    pub cargo_capacity: f64,
    pub expected_slots: Option<u32>,
    pub satisfied: bool,
    pub containers: Vec<ContainerItem>,
    pub strategies: Vec<StrategyRun>,
    pub resolution: PassStats,
}

impl CargoSummary {
    pub fn new(entity: Record<'_>, acc: &Accumulator, resolution: PassStats) -> Self {
        Self {
            name: entity.name().to_string(),
            identifier: entity.reference().map(|id| id.to_string()),
            manufacturer: manufacturer(entity),
            cargo_capacity: acc.total_capacity(),
            expected_slots: acc.expected_slots(),
            satisfied: acc.is_satisfied(),
            containers: acc.items().to_vec(),
            strategies: acc.runs().to_vec(),
            resolution,
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Name of the manufacturer spliced under the entity, if any.
fn manufacturer(entity: Record<'_>) -> Option<String> {
    MANUFACTURER_PATHS.iter().find_map(|path| {
        let record = entity.get(path).ok()?.to_record()?;
        let name = record.raw("Code").unwrap_or_else(|| record.name());
        Some(name.to_string())
    })
}

/// Copy the named record out of the store and resolve it fully.
pub fn enrich(
    store: &dyn RecordStore,
    config: &Config,
    name: &str,
) -> Result<(Document, PassStats)> {
    let record = store
        .resolve_by_type_name(name)
        .ok_or_else(|| anyhow!("no record named `{name}`"))?;
    let mut doc = record.document().clone();
    let stats = Resolver::new(store)
        .with_options(config.resolver.clone())
        .resolve_fully(&mut doc);
    Ok((doc, stats))
}

/// Resolve the named entity, flatten its equipment and aggregate its cargo
/// capacity.
pub fn summarize(store: &dyn RecordStore, config: &Config, name: &str) -> Result<CargoSummary> {
    let pipeline = Pipeline::new(store, &config.aggregation)?;
    let (doc, stats) = enrich(store, config, name)?;
    let entity = doc.root_record();
    let equipment = loadout::flatten(entity);
    let acc = pipeline.aggregate(entity, &equipment);
    info!(
        "{}: {} cargo units from {} containers",
        entity.name(),
        acc.total_capacity(),
        acc.items().len()
    );
    Ok(CargoSummary::new(entity, &acc, stats))
}
