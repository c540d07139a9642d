// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use crate::common::*;

use anyhow::Result;
use recforge::loadout::{flatten, Equipment};
use recforge::*;

fn port_names<'a>(equipment: &[&'a Equipment<'a>]) -> Vec<&'a str> {
    equipment.iter().map(|e| e.port_name).collect()
}

#[test]
fn declared_ports_come_first() -> Result<()> {
    let store = load_store()?;
    let doc = resolved(&store, "TEST_Freighter")?;
    let equipment = flatten(doc.root_record());

    let names: Vec<&str> = equipment.iter().map(|e| e.port_name).collect();
    assert_eq!(
        names,
        ["hardpoint_cargogrid_main", "hardpoint_storage", "hardpoint_seat"]
    );
    assert_eq!(
        equipment[0].type_name(),
        Some("TEST_Hauler_CargoGrid_Main")
    );
    assert_eq!(equipment[0].port_types, ["CargoGrid"]);
    assert!(equipment[1].item.is_none());
    assert_eq!(equipment[2].port_types, ["Seat"]);
    Ok(())
}

#[test]
fn undeclared_entries_are_appended() -> Result<()> {
    let store = load_store()?;
    let doc = resolved(&store, "TEST_Miner")?;
    let equipment = flatten(doc.root_record());

    assert_eq!(equipment.len(), 2);
    assert!(equipment.iter().all(|e| e.port_types.is_empty()));
    assert!(equipment.iter().all(|e| e.type_name() == Some("TEST_OrePod")));
    assert_eq!(
        equipment[0].identifier(),
        parse_identifier("66666666-6666-6666-6666-666666666666")
    );
    Ok(())
}

#[test]
fn nested_loadouts() -> Result<()> {
    let doc = Document::from_xml_str(
        r#"<EntityClassDefinition.TEST_Nest>
             <Components>
               <SEntityComponentDefaultLoadoutParams>
                 <loadout>
                   <SItemPortLoadoutManualParams>
                     <entries>
                       <SItemPortLoadoutEntryParams itemPortName="hardpoint_turret">
                         <InstalledItem __name="TEST_Turret">
                           <Components>
                             <SEntityComponentDefaultLoadoutParams>
                               <loadout>
                                 <SItemPortLoadoutManualParams>
                                   <entries>
                                     <SItemPortLoadoutEntryParams itemPortName="hardpoint_gun">
                                       <InstalledItem __name="TEST_Gun" />
                                     </SItemPortLoadoutEntryParams>
                                   </entries>
                                 </SItemPortLoadoutManualParams>
                               </loadout>
                             </SEntityComponentDefaultLoadoutParams>
                           </Components>
                         </InstalledItem>
                       </SItemPortLoadoutEntryParams>
                       <SItemPortLoadoutEntryParams itemPortName="hardpoint_pod">
                         <InstalledItem __name="TEST_Pod" />
                         <loadout>
                           <SItemPortLoadoutManualParams>
                             <entries>
                               <SItemPortLoadoutEntryParams itemPortName="hardpoint_override">
                                 <InstalledItem __name="TEST_Override" />
                               </SItemPortLoadoutEntryParams>
                             </entries>
                           </SItemPortLoadoutManualParams>
                         </loadout>
                       </SItemPortLoadoutEntryParams>
                       <SItemPortLoadoutEntryParams />
                     </entries>
                   </SItemPortLoadoutManualParams>
                 </loadout>
               </SEntityComponentDefaultLoadoutParams>
             </Components>
           </EntityClassDefinition.TEST_Nest>"#,
    )?;
    let equipment = flatten(doc.root_record());

    // Entries without a port name are skipped.
    assert_eq!(equipment.len(), 2);

    let turret = &equipment[0];
    assert_eq!(turret.type_name(), Some("TEST_Turret"));
    assert_eq!(turret.children.len(), 1);
    assert_eq!(turret.children[0].type_name(), Some("TEST_Gun"));

    // Entry-level overrides take the place of the item's defaults.
    let pod = &equipment[1];
    assert_eq!(pod.children[0].port_name, "hardpoint_override");

    let all = port_names(&turret.walk());
    assert_eq!(all, ["hardpoint_turret", "hardpoint_gun"]);
    Ok(())
}
