// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use recforge::*;

#[test]
fn partial_json_keeps_defaults() -> Result<()> {
    let config = Config::from_json_str(
        r#"{
             "resolver": { "max_passes": 2 },
             "aggregation": { "slot_keyword": "hold", "units": { "cubic_per_unit": 1.0 } }
           }"#,
    )?;
    assert_eq!(config.resolver.max_passes, 2);
    assert_eq!(config.aggregation.slot_keyword, "hold");
    assert_eq!(config.aggregation.container_attach_type, "CargoGrid");
    assert_eq!(config.aggregation.units.cubic_per_unit, 1.0);
    assert_eq!(
        config.aggregation.units.centi_path,
        UnitConfig::default().centi_path
    );
    assert!(Config::from_json_str("{ \"resolver\": 1 }").is_err());
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_config() -> Result<()> {
    let config = Config::from_yaml_str(
        r#"
aggregation:
  template_suffix: _Proto
  fallback_capacity_paths:
    - cargo
"#,
    )?;
    assert_eq!(config.aggregation.template_suffix, "_Proto");
    assert_eq!(config.aggregation.fallback_capacity_paths, ["cargo"]);
    assert_eq!(config.resolver, ResolverOptions::default());
    Ok(())
}

#[test]
fn config_files() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("recforge-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let json = dir.join("settings.json");
    std::fs::write(&json, r#"{ "resolver": { "max_passes": 4 } }"#)?;
    assert_eq!(Config::from_file(&json)?.resolver.max_passes, 4);

    let toml = dir.join("settings.toml");
    std::fs::write(&toml, "")?;
    assert!(Config::from_file(&toml).is_err());
    assert!(Config::from_file(dir.join("missing.json")).is_err());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
