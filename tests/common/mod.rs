// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{anyhow, Result};
use recforge::*;

pub const RECORDS_DIR: &str = "tests/records";

pub fn load_store() -> Result<MemoryStore> {
    MemoryStore::load_xml_dir(RECORDS_DIR)
}

/// Resolve the named entity against `store` and hand back its document.
pub fn resolved(store: &MemoryStore, name: &str) -> Result<Document> {
    let (doc, _) = enrich(store, &Config::default(), name)?;
    Ok(doc)
}

/// Full pipeline for one entity.
pub fn aggregate(store: &MemoryStore, name: &str) -> Result<recforge::cargo::Accumulator> {
    let doc = resolved(store, name)?;
    let entity = doc.root_record();
    let equipment = loadout::flatten(entity);
    let pipeline = recforge::cargo::Pipeline::new(store, &AggregationConfig::default())?;
    Ok(pipeline.aggregate(entity, &equipment))
}

pub fn strategy_names(acc: &recforge::cargo::Accumulator) -> Vec<&'static str> {
    acc.runs().iter().map(|r| r.strategy).collect()
}

pub fn child<'a>(record: Record<'a>, path: &[&str]) -> Result<Record<'a>> {
    record
        .child_path(path)
        .ok_or_else(|| anyhow!("missing {} under {}", path.join("/"), record.tag()))
}
