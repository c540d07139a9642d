// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod cargo;
mod config;
mod document;
mod export;
mod handlers;
pub mod loadout;
mod path;
mod record;
mod registry;
mod resolver;
mod store;
mod units;
mod value;

pub use config::{AggregationConfig, Config, ResolverOptions, UnitConfig};
pub use document::{Document, DocumentError, NodeId};
pub use export::{enrich, summarize, CargoSummary};
pub use handlers::{Enrichment, Handler, Lookup};
pub use path::{PathError, PathQuery};
pub use record::{
    is_reserved, parse_identifier, Record, NAME_ATTRIBUTE, PATH_ATTRIBUTE, REF_ATTRIBUTE,
    RESERVED_ATTRIBUTES, TYPE_ATTRIBUTE,
};
pub use registry::{instances::BUILTIN_REGISTRY, Binding, HandlerRegistry, RegistryError};
pub use resolver::{PassStats, Resolver};
pub use store::{MemoryStore, Reference, RecordStore};
pub use units::{UnitCalculator, UnitPaths};
pub use value::{coerce, parse_number, Value};
