// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Enrichment handlers.
//!
//! Every handler follows the reference-splice pattern: read a reference from
//! the node, resolve it through the store, deep-copy the resolved record into
//! the current document (optionally renamed to a conventional tag) and append
//! it as a child of the node.

use crate::document::{Document, NodeId};
use crate::record::{parse_identifier, NAME_ATTRIBUTE, REF_ATTRIBUTE};
use crate::store::{RecordStore, Reference};

use log::{debug, trace, warn};

/// How a handler turns node attributes into a [`Reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Identifier held in one attribute.
    Identifier { attribute: &'static str },
    /// Identifier, falling back to a type name when the identifier is absent
    /// or the all-zero sentinel.
    IdentifierOrName {
        id_attribute: &'static str,
        name_attribute: &'static str,
    },
    /// File path; the record is looked up by the file stem.
    FilePath { attribute: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    pub lookup: Lookup,
    /// Tag given to the spliced copy. `None` keeps the resolved root's tag.
    pub target: Option<&'static str>,
}

/// Outcome of one enrichment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrichment {
    NoReference,
    AlreadySpliced,
    Unresolved,
    Spliced(NodeId),
}

/// Record name from a path such as `Scripts/Loadouts/Default_Avenger.xml`.
pub(crate) fn file_stem(path: &str) -> Option<&str> {
    let file = path.trim().rsplit(['/', '\\']).next()?;
    let stem = match file.rfind('.') {
        Some(pos) if pos > 0 => &file[..pos],
        _ => file,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// True if `node` already has a child tagged `tag` that stands for the record
/// identified by `id`, or (for records without identity) named `name`.
fn already_spliced(
    doc: &Document,
    node: NodeId,
    tag: &str,
    id: Option<&uuid::Uuid>,
    name: Option<&str>,
) -> bool {
    doc.children(node).iter().any(|child| {
        if doc.tag(*child) != tag {
            return false;
        }
        match (id, name) {
            (Some(id), _) => {
                doc.attribute(*child, REF_ATTRIBUTE)
                    .and_then(parse_identifier)
                    .as_ref()
                    == Some(id)
            }
            (None, Some(name)) => doc.attribute(*child, NAME_ATTRIBUTE) == Some(name),
            (None, None) => false,
        }
    })
}

impl Handler {
    pub const fn by_identifier(attribute: &'static str, target: &'static str) -> Self {
        Self {
            lookup: Lookup::Identifier { attribute },
            target: Some(target),
        }
    }

    pub const fn by_identifier_or_name(
        id_attribute: &'static str,
        name_attribute: &'static str,
        target: &'static str,
    ) -> Self {
        Self {
            lookup: Lookup::IdentifierOrName {
                id_attribute,
                name_attribute,
            },
            target: Some(target),
        }
    }

    pub const fn by_file_path(attribute: &'static str, target: &'static str) -> Self {
        Self {
            lookup: Lookup::FilePath { attribute },
            target: Some(target),
        }
    }

    /// The reference this handler would follow from `node`, if any.
    pub fn reference(&self, doc: &Document, node: NodeId) -> Option<Reference> {
        match self.lookup {
            Lookup::Identifier { attribute } => doc
                .attribute(node, attribute)
                .and_then(parse_identifier)
                .map(Reference::Id),
            Lookup::IdentifierOrName {
                id_attribute,
                name_attribute,
            } => Reference::from_attributes(
                doc.attribute(node, id_attribute),
                doc.attribute(node, name_attribute),
            ),
            Lookup::FilePath { attribute } => doc
                .attribute(node, attribute)
                .and_then(file_stem)
                .map(|stem| Reference::Name(stem.to_string())),
        }
    }

    /// Splice the record referenced by `node` under it.
    ///
    /// Missing references and store misses leave the node untouched.
    pub fn enrich(
        &self,
        doc: &mut Document,
        node: NodeId,
        store: &dyn RecordStore,
    ) -> Enrichment {
        let reference = match self.reference(doc, node) {
            Some(r) => r,
            None => return Enrichment::NoReference,
        };

        // Cheap check before touching the store.
        if let (Reference::Id(id), Some(target)) = (&reference, self.target) {
            if already_spliced(doc, node, target, Some(id), None) {
                trace!("{} already spliced under {}", id, doc.tag(node));
                return Enrichment::AlreadySpliced;
            }
        }

        let resolved = match store.resolve(&reference) {
            Some(r) => r,
            None => {
                debug!("unresolved reference {reference:?} on {}", doc.tag(node));
                return Enrichment::Unresolved;
            }
        };

        let tag = self.target.unwrap_or(resolved.tag());
        let resolved_id = resolved.reference();
        let resolved_name = resolved.name();
        if already_spliced(doc, node, tag, resolved_id.as_ref(), Some(resolved_name)) {
            return Enrichment::AlreadySpliced;
        }

        let copy = match doc.import(resolved) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to import {reference:?}: {e}");
                return Enrichment::Unresolved;
            }
        };
        let named = match resolved.raw(NAME_ATTRIBUTE) {
            Some(_) => Ok(()),
            None => doc.set_attribute(copy, NAME_ATTRIBUTE, resolved_name),
        };
        let spliced = named
            .and_then(|_| doc.set_tag(copy, tag))
            .and_then(|_| doc.append_child(node, copy));
        if let Err(e) = spliced {
            warn!("failed to splice {reference:?}: {e}");
            return Enrichment::Unresolved;
        }
        debug!("spliced `{resolved_name}` as {tag} under {}", doc.tag(node));
        Enrichment::Spliced(copy)
    }
}
