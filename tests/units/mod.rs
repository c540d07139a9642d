// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use recforge::*;

fn units(store: &MemoryStore, xml: &str) -> Result<Option<f64>> {
    let paths = UnitPaths::compile(&UnitConfig::default())?;
    let doc = Document::from_xml_str(xml)?;
    Ok(UnitCalculator::new(store, &paths).units_for(doc.root_record()))
}

#[test]
fn explicit_fields_in_priority_order() -> Result<()> {
    let store = MemoryStore::new();
    let cases = [
        (
            r#"<InventoryContainer><capacity><SStandardCargoUnit standardCargoUnits="4" /><SCentiCargoUnit centiSCU="900" /></capacity></InventoryContainer>"#,
            Some(4.0),
        ),
        (
            r#"<InventoryContainer><capacity><SCentiCargoUnit centiSCU="250" /></capacity></InventoryContainer>"#,
            Some(2.5),
        ),
        (
            r#"<InventoryContainer><capacity><SMicroCargoUnit microSCU="1500000" /></capacity></InventoryContainer>"#,
            Some(1.5),
        ),
        (
            r#"<InventoryContainer><capacity><SStandardCargoUnit standardCargoUnits="lots" /><SMicroCargoUnit microSCU="2000000" /></capacity></InventoryContainer>"#,
            Some(2.0),
        ),
        (r#"<InventoryContainer />"#, None),
    ];

    for (xml, expected) in cases {
        assert_eq!(units(&store, xml)?, expected, "{xml}");
    }
    Ok(())
}

#[test]
fn geometry_when_no_unit_fields() -> Result<()> {
    let store = MemoryStore::new();

    let primary = r#"<InventoryContainer>
                       <interiorDimensions x="2.5" y="2.5" z="1.25" />
                     </InventoryContainer>"#;
    assert_eq!(units(&store, primary)?, Some(4.0));

    let alternate = r#"<InventoryContainer>
                         <inventoryType>
                           <InventoryOpenContainerType>
                             <interiorDimensions x="1.25" y="1.25" z="1.25" />
                           </InventoryOpenContainerType>
                         </inventoryType>
                       </InventoryContainer>"#;
    assert_eq!(units(&store, alternate)?, Some(1.0));

    let partial = r#"<InventoryContainer><interiorDimensions x="1" y="2" /></InventoryContainer>"#;
    assert_eq!(units(&store, partial)?, None);

    // Explicit units beat geometry.
    let both = r#"<InventoryContainer>
                    <capacity><SStandardCargoUnit standardCargoUnits="3" /></capacity>
                    <interiorDimensions x="2.5" y="2.5" z="1.25" />
                  </InventoryContainer>"#;
    assert_eq!(units(&store, both)?, Some(3.0));
    Ok(())
}

#[test]
fn stored_record_wins_over_local_fields() -> Result<()> {
    let mut store = MemoryStore::new();
    store.insert_xml(
        r#"<InventoryContainer.Stored __ref="77777777-7777-7777-7777-777777777777">
             <capacity><SStandardCargoUnit standardCargoUnits="10" /></capacity>
           </InventoryContainer.Stored>"#,
    )?;

    let known = r#"<InventoryContainer __ref="77777777-7777-7777-7777-777777777777">
                     <capacity><SStandardCargoUnit standardCargoUnits="3" /></capacity>
                   </InventoryContainer>"#;
    assert_eq!(units(&store, known)?, Some(10.0));

    let unknown = r#"<InventoryContainer __ref="88888888-8888-8888-8888-888888888888">
                       <capacity><SStandardCargoUnit standardCargoUnits="3" /></capacity>
                     </InventoryContainer>"#;
    assert_eq!(units(&store, unknown)?, Some(3.0));
    Ok(())
}

#[test]
fn zero_cubic_size_disables_geometry() -> Result<()> {
    let store = MemoryStore::new();
    let config = UnitConfig {
        cubic_per_unit: 0.0,
        ..UnitConfig::default()
    };
    let paths = UnitPaths::compile(&config)?;
    let doc = Document::from_xml_str(
        r#"<InventoryContainer><interiorDimensions x="2.5" y="2.5" z="1.25" /></InventoryContainer>"#,
    )?;
    assert_eq!(
        UnitCalculator::new(&store, &paths).units_for(doc.root_record()),
        None
    );
    Ok(())
}
