// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::document::Document;
use crate::record::{parse_identifier, Record};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Locator for another record: a stable identifier or a symbolic type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Id(Uuid),
    Name(String),
}

impl Reference {
    /// Build the preferred reference from an identifier/name attribute pair.
    /// The identifier wins unless it is missing, unparsable or all-zero.
    pub fn from_attributes(id: Option<&str>, name: Option<&str>) -> Option<Reference> {
        if let Some(id) = id.and_then(parse_identifier) {
            return Some(Reference::Id(id));
        }
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Some(Reference::Name(n.to_string())),
            _ => None,
        }
    }
}

/// Read-only lookup contract over a corpus of records.
///
/// Implementations are consumed through shared references only. A store
/// used from several threads must also be `Sync`.
pub trait RecordStore {
    fn resolve_by_identifier(&self, id: &Uuid) -> Option<Record<'_>>;

    fn resolve_by_type_name(&self, name: &str) -> Option<Record<'_>>;

    /// Records whose name starts with `prefix`, in store iteration order.
    fn find_by_type_prefix(&self, prefix: &str) -> Vec<Record<'_>>;

    fn iter_all(&self) -> Box<dyn Iterator<Item = Record<'_>> + '_>;

    fn count(&self) -> usize;

    fn resolve(&self, reference: &Reference) -> Option<Record<'_>> {
        match reference {
            Reference::Id(id) => self.resolve_by_identifier(id),
            Reference::Name(name) => self.resolve_by_type_name(name),
        }
    }
}

/// In-memory [`RecordStore`] holding one document per record.
///
/// Names are matched exactly first, then case-insensitively. Prefix scans are
/// case-insensitive. Iteration follows insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<(String, Document)>,
    by_id: HashMap<Uuid, usize>,
    by_name: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record under the name derived from its root element.
    pub fn insert(&mut self, document: Document) -> usize {
        let name = document.root_record().name().to_string();
        self.insert_named(name, document)
    }

    /// Add a record under an explicit name. When a name or identifier is
    /// already taken, the earlier record keeps it.
    pub fn insert_named(&mut self, name: impl Into<String>, document: Document) -> usize {
        let name = name.into();
        let idx = self.records.len();

        if let Some(id) = document.root_record().reference() {
            match self.by_id.get(&id) {
                Some(existing) => warn!(
                    "duplicate record identifier {id}: `{name}` shadowed by `{}`",
                    self.records[*existing].0
                ),
                None => {
                    self.by_id.insert(id, idx);
                }
            }
        }

        if self.by_name.contains_key(&name) {
            warn!("duplicate record name `{name}`");
        } else {
            self.by_name.insert(name.clone(), idx);
        }
        self.by_lower_name
            .entry(name.to_lowercase())
            .or_insert(idx);

        self.records.push((name, document));
        idx
    }

    pub fn from_documents<I: IntoIterator<Item = Document>>(documents: I) -> Self {
        let mut store = Self::new();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    /// Parse and add xml text.
    pub fn insert_xml(&mut self, xml: &str) -> Result<usize> {
        Ok(self.insert(Document::from_xml_str(xml)?))
    }

    /// Load every `*.xml` file below `dir`.
    ///
    /// Records whose root tag carries a `Type.Name` pair are named after the
    /// tag; other files (loadouts, for instance) are named after their file
    /// stem.
    pub fn load_xml_dir<P: AsRef<Path>>(dir: P) -> Result<MemoryStore> {
        let dir = dir.as_ref();
        let mut store = MemoryStore::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            let path = entry.path();
            let is_xml = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("xml"))
                .unwrap_or(false);
            if !entry.file_type().is_file() || !is_xml {
                continue;
            }

            let document = Document::from_xml_file(path)?;
            let name = if document.root_record().tag().contains('.') {
                document.root_record().name().to_string()
            } else {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            debug!("loaded record `{name}` from {}", path.display());
            store.insert_named(name, document);
        }
        info!("loaded {} records from {}", store.count(), dir.display());
        Ok(store)
    }

    fn record_at(&self, idx: usize) -> Option<Record<'_>> {
        self.records.get(idx).map(|(_, doc)| doc.root_record())
    }
}

impl RecordStore for MemoryStore {
    fn resolve_by_identifier(&self, id: &Uuid) -> Option<Record<'_>> {
        self.by_id.get(id).and_then(|idx| self.record_at(*idx))
    }

    fn resolve_by_type_name(&self, name: &str) -> Option<Record<'_>> {
        let idx = self
            .by_name
            .get(name)
            .or_else(|| self.by_lower_name.get(&name.to_lowercase()))?;
        self.record_at(*idx)
    }

    fn find_by_type_prefix(&self, prefix: &str) -> Vec<Record<'_>> {
        let prefix = prefix.to_lowercase();
        self.records
            .iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(&prefix))
            .map(|(_, doc)| doc.root_record())
            .collect()
    }

    fn iter_all(&self) -> Box<dyn Iterator<Item = Record<'_>> + '_> {
        Box::new(self.records.iter().map(|(_, doc)| doc.root_record()))
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}
