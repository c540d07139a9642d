// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::config::UnitConfig;
use crate::path::{PathError, PathQuery};
use crate::record::Record;
use crate::store::RecordStore;

/// Raw unit encodings and their divisor to standard cargo units.
const CENTI_PER_UNIT: f64 = 100.0;
const MICRO_PER_UNIT: f64 = 1_000_000.0;

/// [`UnitConfig`] with its paths parsed.
#[derive(Debug, Clone)]
pub struct UnitPaths {
    standard: PathQuery,
    centi: PathQuery,
    micro: PathQuery,
    dimensions: Vec<PathQuery>,
    cubic_per_unit: f64,
}

impl UnitPaths {
    pub fn compile(config: &UnitConfig) -> Result<Self, PathError> {
        Ok(Self {
            standard: PathQuery::parse(&config.standard_path)?,
            centi: PathQuery::parse(&config.centi_path)?,
            micro: PathQuery::parse(&config.micro_path)?,
            dimensions: config
                .dimension_paths
                .iter()
                .map(|p| PathQuery::parse(p))
                .collect::<Result<_, _>>()?,
            cubic_per_unit: config.cubic_per_unit,
        })
    }

    /// Units stated by the container itself: an explicit unit field, else its
    /// interior volume.
    pub fn intrinsic_units(&self, container: Record<'_>) -> Option<f64> {
        self.explicit_units(container)
            .or_else(|| self.geometric_units(container))
    }

    /// The first explicit unit field present, in priority order.
    pub fn explicit_units(&self, container: Record<'_>) -> Option<f64> {
        if let Some(n) = self.standard.number(container) {
            return Some(n);
        }
        if let Some(n) = self.centi.number(container) {
            return Some(n / CENTI_PER_UNIT);
        }
        self.micro.number(container).map(|n| n / MICRO_PER_UNIT)
    }

    /// `x * y * z` of the first dimension element carrying all three.
    pub fn geometric_units(&self, container: Record<'_>) -> Option<f64> {
        if self.cubic_per_unit <= 0.0 {
            return None;
        }
        self.dimensions.iter().find_map(|path| {
            let dims = path.record(container)?;
            let x = dims.attribute("x").to_number()?;
            let y = dims.attribute("y").to_number()?;
            let z = dims.attribute("z").to_number()?;
            Some(x * y * z / self.cubic_per_unit)
        })
    }
}

/// Converts inventory containers into cargo units.
pub struct UnitCalculator<'c> {
    store: &'c dyn RecordStore,
    paths: &'c UnitPaths,
}

impl<'c> UnitCalculator<'c> {
    pub fn new(store: &'c dyn RecordStore, paths: &'c UnitPaths) -> Self {
        Self { store, paths }
    }

    /// Capacity of `container` in cargo units.
    ///
    /// A container with an identifier is looked up in the store and the stored
    /// record's own units win. Otherwise, or if that yields nothing, the
    /// container's explicit unit fields are used, then its interior
    /// dimensions.
    pub fn units_for(&self, container: Record<'_>) -> Option<f64> {
        if let Some(id) = container.reference() {
            if let Some(units) = self
                .store
                .resolve_by_identifier(&id)
                .and_then(|stored| self.paths.intrinsic_units(stored))
            {
                return Some(units);
            }
        }
        self.paths.intrinsic_units(container)
    }
}
