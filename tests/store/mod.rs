// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use crate::common::*;

use anyhow::Result;
use recforge::*;

#[test]
fn loads_record_directory() -> Result<()> {
    let store = load_store()?;
    assert_eq!(store.count(), 20);

    // Files without a `Type.Name` root are named after the file.
    let loadout = store.resolve_by_type_name("Default_TEST_Courier");
    assert_eq!(loadout.map(|r| r.tag()), Some("Loadout"));
    assert!(MemoryStore::load_xml_dir("tests/no-such-dir").is_err());
    Ok(())
}

#[test]
fn lookups() -> Result<()> {
    let store = load_store()?;

    let id = parse_identifier("22222222-2222-2222-2222-222222222222");
    let by_id = id.and_then(|id| store.resolve_by_identifier(&id));
    assert_eq!(by_id.map(|r| r.name()), Some("TEST_Hauler_CargoGrid_Main"));

    let exact = store.resolve_by_type_name("TEST_Hauler");
    let folded = store.resolve_by_type_name("test_hauler");
    assert!(exact.is_some());
    assert_eq!(exact, folded);
    assert!(store.resolve_by_type_name("TEST_Nothing").is_none());

    let by_ref = store.resolve(&Reference::Name("TEST_OrePod".to_string()));
    assert_eq!(
        by_ref.and_then(|r| r.reference()),
        parse_identifier("66666666-6666-6666-6666-666666666666")
    );
    Ok(())
}

#[test]
fn prefix_scan_is_case_insensitive_and_ordered() -> Result<()> {
    let store = load_store()?;
    let names: Vec<&str> = store
        .find_by_type_prefix("test_freighter_cargogrid_")
        .iter()
        .map(|r| r.name())
        .collect();
    assert_eq!(
        names,
        [
            "TEST_Freighter_CargoGrid_Locker",
            "TEST_Freighter_CargoGrid_Rear",
            "TEST_Freighter_CargoGrid_Rear_Template",
            "TEST_Freighter_CargoGrid_Small",
        ]
    );
    assert_eq!(store.iter_all().count(), store.count());
    Ok(())
}

#[test]
fn first_record_keeps_duplicate_keys() -> Result<()> {
    let mut store = MemoryStore::new();
    store.insert_xml(r#"<Item.Dup __ref="12345678-1234-1234-1234-123456789abc" order="1" />"#)?;
    store.insert_xml(r#"<Item.Dup __ref="12345678-1234-1234-1234-123456789abc" order="2" />"#)?;
    assert_eq!(store.count(), 2);

    let by_name = store.resolve_by_type_name("Dup");
    assert_eq!(by_name.map(|r| r.attribute("order")), Some(Value::Number(1.0)));

    let id = parse_identifier("12345678-1234-1234-1234-123456789abc");
    let by_id = id.and_then(|id| store.resolve_by_identifier(&id));
    assert_eq!(by_id.map(|r| r.attribute("order")), Some(Value::Number(1.0)));
    Ok(())
}

#[test]
fn references_prefer_identifiers() {
    let id = "12345678-1234-1234-1234-123456789abc";
    assert_eq!(
        Reference::from_attributes(Some(id), Some("Name")),
        parse_identifier(id).map(Reference::Id)
    );
    assert_eq!(
        Reference::from_attributes(Some("00000000-0000-0000-0000-000000000000"), Some("Name")),
        Some(Reference::Name("Name".to_string()))
    );
    assert_eq!(
        Reference::from_attributes(Some("garbage"), Some(" ")),
        None
    );
    assert_eq!(Reference::from_attributes(None, None), None);
}
