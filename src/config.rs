// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tunable names, field paths and constants.
//!
//! Defaults describe the record layout of the shipped game data. Any field
//! may be overridden from json (or yaml with the `yaml` feature); missing
//! fields keep their defaults.

use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Where capacity units live on an inventory container and how raw values
/// convert to cargo units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    pub standard_path: String,
    pub centi_path: String,
    pub micro_path: String,
    /// Elements carrying `x`, `y`, `z` interior dimensions, tried in order.
    pub dimension_paths: Vec<String>,
    /// Cubic length units per cargo unit (a 1.25 m cube).
    pub cubic_per_unit: f64,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            standard_path: "capacity/SStandardCargoUnit@standardCargoUnits".to_string(),
            centi_path: "capacity/SCentiCargoUnit@centiSCU".to_string(),
            micro_path: "capacity/SMicroCargoUnit@microSCU".to_string(),
            dimension_paths: vec![
                "./interiorDimensions".to_string(),
                "inventoryType/*/interiorDimensions".to_string(),
            ],
            cubic_per_unit: 1.953125,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Attach type of equipment items that are cargo containers.
    pub container_attach_type: String,
    /// Keyword that marks a container slot in port names (case-insensitive).
    pub slot_keyword: String,
    /// Keyword used when building container record names.
    pub container_keyword: String,
    /// Name suffix of template records that never count as real containers.
    pub template_suffix: String,
    /// Attach type and subtype of bulk cargo resource containers.
    pub cargo_resource_type: String,
    pub cargo_resource_subtype: String,

    pub attach_type_path: String,
    pub attach_subtype_path: String,
    /// Inventory container component on items and entities.
    pub inventory_component_path: String,
    /// Reference attribute on the inventory component.
    pub container_reference_attribute: String,
    /// Tag of a container spliced under the inventory component.
    pub inline_container_tag: String,
    pub bulk_capacity_path: String,
    pub variant_path: String,
    pub base_definition_path: String,
    /// Hardcoded capacities, tried in order.
    pub fallback_capacity_paths: Vec<String>,

    pub units: UnitConfig,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            container_attach_type: "CargoGrid".to_string(),
            slot_keyword: "cargogrid".to_string(),
            container_keyword: "CargoGrid".to_string(),
            template_suffix: "_Template".to_string(),
            cargo_resource_type: "ResourceContainer".to_string(),
            cargo_resource_subtype: "Cargo".to_string(),

            attach_type_path: "Components/SAttachableComponentParams/AttachDef@Type".to_string(),
            attach_subtype_path: "Components/SAttachableComponentParams/AttachDef@SubType"
                .to_string(),
            inventory_component_path: "Components/SCItemInventoryContainerComponentParams"
                .to_string(),
            container_reference_attribute: "containerParams".to_string(),
            inline_container_tag: "InventoryContainer".to_string(),
            bulk_capacity_path:
                "Components/ResourceContainer/capacity/SStandardCargoUnit@standardCargoUnits"
                    .to_string(),
            variant_path: "Components/VehicleComponentParams@modification".to_string(),
            base_definition_path: "Components/VehicleComponentParams@vehicleDefinition"
                .to_string(),
            fallback_capacity_paths: vec![
                "Components/VehicleComponentParams@cargoCapacity".to_string(),
                "cargoCapacity".to_string(),
            ],

            units: UnitConfig::default(),
        }
    }
}

/// Resolution pass settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Upper bound on passes made by `Resolver::resolve_fully`. Reference
    /// cycles between records would otherwise splice forever.
    pub max_passes: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverOptions,
    pub aggregation: AggregationConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Config> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Config> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.display()),
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => bail!(
                "Unsupported config file `{}`. Must be json or yaml.",
                path.display()
            ),
        }
    }
}
