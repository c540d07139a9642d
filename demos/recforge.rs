// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

fn load(
    records: &str,
    config: Option<String>,
) -> Result<(recforge::MemoryStore, recforge::Config)> {
    let config = match config {
        Some(file) => recforge::Config::from_file(file)?,
        None => recforge::Config::default(),
    };
    let store = recforge::MemoryStore::load_xml_dir(records)?;
    Ok((store, config))
}

fn record_resolve(
    records: String,
    entity: String,
    config: Option<String>,
    stats: bool,
) -> Result<()> {
    let (store, config) = load(&records, config)?;

    // Copy the entity and splice in everything it references.
    let (doc, pass_stats) = recforge::enrich(&store, &config, &entity)?;
    println!("{}", serde_json::to_string_pretty(&doc.root_record())?);

    if stats {
        eprintln!("{}", serde_json::to_string_pretty(&pass_stats)?);
    }
    Ok(())
}

fn record_cargo(records: String, entities: Vec<String>, config: Option<String>) -> Result<()> {
    let (store, config) = load(&records, config)?;

    let mut summaries = vec![];
    for entity in &entities {
        summaries.push(recforge::summarize(&store, &config, entity)?);
    }

    match summaries.as_slice() {
        [single] => println!("{}", single.to_json_string()?),
        many => println!("{}", serde_json::to_string_pretty(many)?),
    }
    Ok(())
}

fn record_query(file: String, path: String) -> Result<()> {
    if !file.ends_with(".xml") {
        bail!("Unsupported record file `{file}`. Must be xml.");
    }
    let doc = recforge::Document::from_xml_file(&file)?;

    // Parse the path once, then evaluate.
    let query = recforge::PathQuery::parse(&path)?;
    let value = query.eval(doc.root_record(), recforge::Value::Undefined);
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[derive(Subcommand)]
enum RecforgeCommand {
    /// Resolve an entity and print the enriched record.
    Resolve {
        /// Directory of xml records.
        #[arg(long, short, value_name = "records-dir")]
        records: String,

        /// Entity name.
        entity: String,

        /// Settings file. json or yaml.
        #[arg(long, short, value_name = "config.json|config.yaml")]
        config: Option<String>,

        /// Print resolution statistics to stderr.
        #[arg(long, short)]
        stats: bool,
    },

    /// Derive the cargo capacity of one or more entities.
    Cargo {
        /// Directory of xml records.
        #[arg(long, short, value_name = "records-dir")]
        records: String,

        /// Entity names.
        #[arg(required(true))]
        entities: Vec<String>,

        /// Settings file. json or yaml.
        #[arg(long, short, value_name = "config.json|config.yaml")]
        config: Option<String>,
    },

    /// Evaluate a path query against a record file.
    Query {
        /// Record file.
        file: String,

        /// Path expression.
        path: String,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: RecforgeCommand,
}

fn main() -> Result<()> {
    // Parse and dispatch command.
    let cli = Cli::parse();
    match cli.command {
        RecforgeCommand::Resolve {
            records,
            entity,
            config,
            stats,
        } => record_resolve(records, entity, config, stats),
        RecforgeCommand::Cargo {
            records,
            entities,
            config,
        } => record_cargo(records, entities, config),
        RecforgeCommand::Query { file, path } => record_query(file, path),
    }
}
