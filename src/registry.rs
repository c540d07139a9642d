// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::handlers::Handler;

use core::fmt;
use std::collections::HashMap;

use log::error;

/// Errors that can occur when building a [`HandlerRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    AlreadyExists { key: String },
    InvalidKey { key: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyExists { key } => {
                write!(
                    f,
                    "handler registration failed: a handler for '{key}' is already registered."
                )
            }
            RegistryError::InvalidKey { key } => {
                write!(f, "handler registration failed: the key '{key}' is invalid (empty segments are not allowed).")
            }
        }
    }
}

impl core::error::Error for RegistryError {}

/// Validates that every `/`-separated segment of a key is non-blank.
pub fn validate_key(key: &str) -> Result<(), RegistryError> {
    if key.split('/').any(|seg| seg.trim().is_empty()) {
        Err(RegistryError::InvalidKey {
            key: key.to_string(),
        })
    } else {
        Ok(())
    }
}

/// A catalogue entry: a scoped key such as
/// `SAttachableComponentParams/AttachDef` and the handler bound to it. The
/// last segment is the bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: String,
    pub handler: Handler,
}

impl Binding {
    pub fn new(key: impl Into<String>, handler: Handler) -> Self {
        Self {
            key: key.into(),
            handler,
        }
    }

    /// Tag name the binding applies to.
    pub fn tag(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Handlers shipped with the crate.
pub const BUILTIN_BINDINGS: &[(&str, Handler)] = &[
    (
        "SAttachableComponentParams/AttachDef",
        Handler::by_identifier("Manufacturer", "Manufacturer"),
    ),
    (
        "VehicleComponentParams",
        Handler::by_identifier("manufacturer", "Manufacturer"),
    ),
    (
        "SCItemInventoryContainerComponentParams",
        Handler::by_identifier("containerParams", "InventoryContainer"),
    ),
    (
        "SAmmoContainerComponentParams",
        Handler::by_identifier("ammoParamsRecord", "AmmoParams"),
    ),
    (
        "SEntityComponentDefaultLoadoutParams/loadout/SItemPortLoadoutXMLParams",
        Handler::by_file_path("loadoutPath", "Loadout"),
    ),
    (
        "SItemPortLoadoutEntryParams",
        Handler::by_identifier_or_name(
            "entityClassReference",
            "entityClassName",
            "InstalledItem",
        ),
    ),
];

/// Maps tag names, optionally scoped by ancestor tags, to handlers.
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    bindings: Vec<Binding>,
    by_tag: HashMap<String, usize>,
    by_lower_tag: HashMap<String, usize>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`BUILTIN_BINDINGS`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (key, handler) in BUILTIN_BINDINGS {
            if let Err(e) = registry.register(Binding::new(*key, *handler)) {
                error!("{e}");
            }
        }
        registry
    }

    pub fn from_bindings<I: IntoIterator<Item = Binding>>(
        bindings: I,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for binding in bindings {
            registry.register(binding)?;
        }
        Ok(registry)
    }

    /// Register a binding. Scoped keys must be unique; several bindings may
    /// share a bare tag, in which case the first one answers bare lookups.
    pub fn register(&mut self, binding: Binding) -> Result<(), RegistryError> {
        validate_key(&binding.key)?;
        if self.bindings.iter().any(|b| b.key == binding.key) {
            return Err(RegistryError::AlreadyExists { key: binding.key });
        }

        let idx = self.bindings.len();
        let tag = binding.tag().to_string();
        self.by_lower_tag.entry(tag.to_lowercase()).or_insert(idx);
        self.by_tag.entry(tag).or_insert(idx);
        self.bindings.push(binding);
        Ok(())
    }

    /// Find the handler for `tag`.
    ///
    /// With a `prefix`, a binding whose scoped key ends in `<prefix>/<tag>`
    /// wins if it is the only one. Otherwise the bare tag is looked up
    /// exactly, then case-insensitively.
    pub fn lookup(&self, tag: &str, prefix: Option<&str>) -> Option<&Handler> {
        if let Some(prefix) = prefix {
            let suffix = format!("{prefix}/{tag}");
            let mut matches = self.bindings.iter().filter(|b| {
                b.key == suffix
                    || (b.key.ends_with(&suffix)
                        && b.key[..b.key.len() - suffix.len()].ends_with('/'))
            });
            if let (Some(only), None) = (matches.next(), matches.next()) {
                return Some(&only.handler);
            }
        }

        self.by_tag
            .get(tag)
            .or_else(|| self.by_lower_tag.get(&tag.to_lowercase()))
            .map(|idx| &self.bindings[*idx].handler)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Global registry instances
pub mod instances {
    use super::*;

    lazy_static::lazy_static! {
        /// Shared registry of the builtin handlers.
        pub static ref BUILTIN_REGISTRY: HandlerRegistry = HandlerRegistry::builtin();
    }
}
