// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use crate::common::*;

use anyhow::Result;
use recforge::cargo::*;
use recforge::*;

const ENTITIES: &[&str] = &[
    "TEST_Hauler",
    "TEST_Freighter",
    "TEST_Shuttle",
    "TEST_Crate",
    "TEST_Miner",
    "TEST_Hauler_Mk2",
    "TEST_Hauler_Mk3",
    "TEST_Courier",
    "TEST_Hauler_Twin",
    "TEST_Hauler_Trio",
];

const MAIN_GRID: &str = "22222222-2222-2222-2222-222222222222";

fn type_names(acc: &Accumulator) -> Vec<&str> {
    acc.items().iter().map(|i| i.type_name.as_str()).collect()
}

#[test]
fn installed_grid_satisfies_single_slot() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Hauler")?;

    assert_eq!(acc.total_capacity(), 10.0);
    assert_eq!(acc.expected_slots(), Some(1));
    assert_eq!(acc.remaining_slots(), 0);
    assert!(acc.is_satisfied());
    assert!(!acc.should_continue_searching());

    let item = &acc.items()[0];
    assert_eq!(item.identifier, format!("hardpoint_cargogrid_main:{MAIN_GRID}"));
    assert!(acc.is_installed(MAIN_GRID));
    assert!(item.is_open());
    assert!(item.is_external());
    assert!(!item.is_closed());

    // Search strategies are gated off once satisfied.
    assert_eq!(strategy_names(&acc), ["equipment-tree", "bulk-capacity"]);
    Ok(())
}

#[test]
fn identical_installed_grids_each_count() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Hauler_Twin")?;

    assert_eq!(acc.total_capacity(), 20.0);
    assert_eq!(acc.items().len(), 2);
    assert_eq!(acc.expected_slots(), Some(2));
    assert_eq!(acc.remaining_slots(), 0);
    assert!(acc.is_satisfied());
    assert_eq!(strategy_names(&acc), ["equipment-tree", "bulk-capacity"]);

    let identifiers: Vec<_> = acc.items().iter().map(|i| i.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        [
            format!("hardpoint_cargogrid_main:{MAIN_GRID}"),
            format!("hardpoint_cargogrid_aux:{MAIN_GRID}"),
        ]
    );
    Ok(())
}

#[test]
fn searches_skip_installed_grid_classes() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Hauler_Trio")?;

    assert_eq!(acc.expected_slots(), Some(3));
    // Convention naming finds `TEST_Hauler_CargoGrid_Main`, which is
    // already installed twice.
    assert_eq!(acc.runs()[1].strategy, "convention-naming");
    assert_eq!(acc.runs()[1].items_added, 0);

    let installed = type_names(&acc)
        .into_iter()
        .filter(|n| *n == "TEST_Hauler_CargoGrid_Main")
        .count();
    assert_eq!(installed, 2);
    assert!(acc.items().iter().all(|i| i.identifier != MAIN_GRID));
    assert!(acc.total_capacity() >= 20.0);
    Ok(())
}

#[test]
fn prefix_scan_fills_empty_slot() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Freighter")?;

    assert_eq!(acc.expected_slots(), Some(2));
    assert_eq!(acc.total_capacity(), 15.0);
    assert!(acc.is_satisfied());
    // Closed and template containers are skipped; the largest remaining
    // candidate wins and the cap stops the scan after one.
    assert_eq!(
        type_names(&acc),
        ["TEST_Hauler_CargoGrid_Main", "TEST_Freighter_CargoGrid_Rear"]
    );
    assert_eq!(
        strategy_names(&acc),
        [
            "equipment-tree",
            "convention-naming",
            "prefix-scan",
            "bulk-capacity"
        ]
    );

    let prefix = &acc.runs()[2];
    assert_eq!(prefix.items_added, 1);
    assert_eq!(prefix.capacity_added, 5.0);
    assert_eq!(prefix.remaining_after, 0);
    Ok(())
}

#[test]
fn hardcoded_capacity_is_the_last_resort() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Shuttle")?;

    assert_eq!(acc.total_capacity(), 20.0);
    assert!(acc.items().is_empty());
    assert_eq!(acc.expected_slots(), None);
    assert!(!acc.is_satisfied());
    assert_eq!(
        strategy_names(&acc),
        [
            "equipment-tree",
            "convention-naming",
            "prefix-scan",
            "base-prefix-scan",
            "bulk-capacity",
            "direct-reference",
            "fallback"
        ]
    );
    Ok(())
}

#[test]
fn direct_reference_uses_entity_container() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Crate")?;

    assert_eq!(acc.total_capacity(), 8.0);
    assert_eq!(type_names(&acc), ["TEST_Crate_Inventory"]);
    assert_eq!(acc.items()[0].identifier, "44444444-4444-4444-4444-444444444444");
    // The fallback gate is closed once a total exists.
    assert_eq!(strategy_names(&acc).last(), Some(&"direct-reference"));
    Ok(())
}

#[test]
fn bulk_capacity_sums_resource_containers() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Miner")?;

    assert_eq!(acc.total_capacity(), 32.0);
    assert!(acc.items().is_empty());
    assert_eq!(acc.seen_count(), 0);
    assert_eq!(strategy_names(&acc).last(), Some(&"bulk-capacity"));
    Ok(())
}

#[test]
fn convention_naming_uses_base_definition() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Hauler_Mk2")?;

    assert_eq!(acc.total_capacity(), 10.0);
    assert_eq!(type_names(&acc), ["TEST_Hauler_CargoGrid_Main"]);
    assert_eq!(acc.runs()[1].strategy, "convention-naming");
    assert_eq!(acc.runs()[1].items_added, 1);
    Ok(())
}

#[test]
fn base_prefix_scan_uses_trimmed_name() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Hauler_Mk3")?;

    assert_eq!(acc.total_capacity(), 10.0);
    assert_eq!(type_names(&acc), ["TEST_Hauler_CargoGrid_Main"]);
    assert_eq!(acc.runs()[3].strategy, "base-prefix-scan");
    assert_eq!(acc.runs()[3].items_added, 1);
    Ok(())
}

#[test]
fn xml_loadouts_feed_the_equipment_tree() -> Result<()> {
    let store = load_store()?;
    let acc = aggregate(&store, "TEST_Courier")?;
    assert_eq!(acc.total_capacity(), 10.0);
    assert!(acc.is_satisfied());
    Ok(())
}

#[test]
fn accumulator_invariants_hold_for_every_entity() -> Result<()> {
    let store = load_store()?;
    for name in ENTITIES {
        let acc = aggregate(&store, name)?;

        assert_eq!(acc.seen_count(), acc.items().len(), "{name}");
        for item in acc.items() {
            assert!(acc.has_seen(&item.identifier), "{name}");
        }

        let mut previous = 0.0;
        for run in acc.runs() {
            assert!(run.total_after >= previous, "{name}: {}", run.strategy);
            previous = run.total_after;
        }
        assert_eq!(previous, acc.total_capacity(), "{name}");

        if let Some(expected) = acc.expected_slots() {
            let filled = u32::try_from(acc.items().len())?;
            assert_eq!(acc.remaining_slots(), expected.saturating_sub(filled), "{name}");
        }
    }
    Ok(())
}

#[test]
fn entities_aggregate_in_parallel() -> Result<()> {
    let store = load_store()?;
    let sequential: Vec<f64> = ENTITIES
        .iter()
        .map(|name| aggregate(&store, name).map(|acc| acc.total_capacity()))
        .collect::<Result<_>>()?;

    let parallel: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = ENTITIES
            .iter()
            .map(|name| {
                let store = &store;
                s.spawn(move || aggregate(store, name).map(|acc| acc.total_capacity()))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow::anyhow!("aggregation panicked"))?)
            .collect::<Result<_>>()
    })?;

    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn custom_strategy_list() -> Result<()> {
    let store = load_store()?;
    let doc = resolved(&store, "TEST_Shuttle")?;
    let entity = doc.root_record();
    let equipment = loadout::flatten(entity);

    let pipeline = Pipeline::new(&store, &AggregationConfig::default())?
        .with_strategies(vec![Box::new(Fallback), Box::new(Fallback)]);
    assert_eq!(pipeline.strategy_names(), ["fallback", "fallback"]);

    let acc = pipeline.aggregate(entity, &equipment);
    // The second run finds the total already set and its gate closed.
    assert_eq!(acc.total_capacity(), 20.0);
    assert_eq!(acc.runs().len(), 1);
    Ok(())
}

#[test]
fn configured_keywords_are_honoured() -> Result<()> {
    let store = load_store()?;
    let config = AggregationConfig {
        fallback_capacity_paths: vec![],
        ..AggregationConfig::default()
    };
    let doc = resolved(&store, "TEST_Shuttle")?;
    let entity = doc.root_record();
    let acc = Pipeline::new(&store, &config)?.aggregate(entity, &loadout::flatten(entity));
    assert_eq!(acc.total_capacity(), 0.0);

    let broken = AggregationConfig {
        attach_type_path: "Components/[".to_string(),
        ..AggregationConfig::default()
    };
    assert!(Pipeline::new(&store, &broken).is_err());
    Ok(())
}

#[test]
fn resource_type_matching_ignores_case() -> Result<()> {
    let store = load_store()?;
    let config = AggregationConfig {
        cargo_resource_type: "RESOURCECONTAINER".to_string(),
        cargo_resource_subtype: "cargo".to_string(),
        ..AggregationConfig::default()
    };
    let doc = resolved(&store, "TEST_Miner")?;
    let entity = doc.root_record();
    let acc = Pipeline::new(&store, &config)?.aggregate(entity, &loadout::flatten(entity));
    assert_eq!(acc.total_capacity(), 32.0);
    Ok(())
}

#[test]
fn summary_serializes_to_json() -> Result<()> {
    let store = load_store()?;
    let summary = summarize(&store, &Config::default(), "TEST_Hauler")?;

    assert_eq!(summary.name, "TEST_Hauler");
    assert_eq!(summary.manufacturer.as_deref(), Some("TSTW"));

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["cargoCapacity"], serde_json::json!(10));
    assert_eq!(json["expectedSlots"], serde_json::json!(1));
    assert_eq!(json["satisfied"], serde_json::json!(true));
    assert_eq!(json["containers"][0]["capacity"], serde_json::json!(10));
    assert_eq!(json["strategies"][0]["strategy"], "equipment-tree");
    assert_eq!(json["resolution"]["passes"], serde_json::json!(3));

    assert!(summarize(&store, &Config::default(), "TEST_Missing").is_err());
    Ok(())
}
