// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::document::{Document, NodeId};
use crate::path::{PathError, PathQuery};
use crate::value::{coerce, Value};

use core::fmt;
use core::ptr;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

/// Stable identity of the record a node represents or points to.
pub const REF_ATTRIBUTE: &str = "__ref";
/// Declared type of a record.
pub const TYPE_ATTRIBUTE: &str = "__type";
/// Source file of a record.
pub const PATH_ATTRIBUTE: &str = "__path";
/// Record name, kept when a spliced copy is renamed.
pub const NAME_ATTRIBUTE: &str = "__name";

/// Attributes that drive resolution and never appear in derived output.
pub const RESERVED_ATTRIBUTES: &[&str] =
    &[REF_ATTRIBUTE, TYPE_ATTRIBUTE, PATH_ATTRIBUTE, NAME_ATTRIBUTE];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// Parse an identifier attribute. Unparsable text and the all-zero sentinel
/// both count as "no identifier".
pub fn parse_identifier(text: &str) -> Option<Uuid> {
    match Uuid::parse_str(text.trim()) {
        Ok(id) if !id.is_nil() => Some(id),
        _ => None,
    }
}

/// Read-only view over one node of a [`Document`].
///
/// A record always carries the document it belongs to, so path queries are
/// evaluated against the node's own subtree and nothing else.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl PartialEq for Record<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Record<'_> {}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}>", self.tag(), self.id.index())
    }
}

impl<'a> Record<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &'a str {
        self.doc.tag(self.id)
    }

    /// Record name: the `__name` attribute if present, else the part of the
    /// tag after its last `.` (`EntityClassDefinition.AEGS_Avenger` is
    /// `AEGS_Avenger`).
    pub fn name(&self) -> &'a str {
        if let Some(name) = self.raw(NAME_ATTRIBUTE) {
            return name;
        }
        let tag = self.tag();
        match tag.rfind('.') {
            Some(pos) => &tag[pos + 1..],
            None => tag,
        }
    }

    /// Declared type: the `__type` attribute, else the tag prefix before `.`.
    pub fn type_name(&self) -> Option<&'a str> {
        if let Some(t) = self.raw(TYPE_ATTRIBUTE) {
            return Some(t);
        }
        self.tag().rfind('.').map(|pos| &self.tag()[..pos])
    }

    /// The record's identity, if it carries a usable `__ref`.
    pub fn reference(&self) -> Option<Uuid> {
        self.raw(REF_ATTRIBUTE).and_then(parse_identifier)
    }

    /// Attribute text without coercion.
    pub fn raw(&self, name: &str) -> Option<&'a str> {
        self.doc.attribute(self.id, name)
    }

    /// Coerced attribute value, `Undefined` if absent.
    pub fn attribute(&self, name: &str) -> Value<'a> {
        match self.raw(name) {
            Some(raw) => coerce(raw),
            None => Value::Undefined,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// All attributes, in document order, uncoerced.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.doc.attributes(self.id)
    }

    /// Attributes fit for output: coerced and without reserved names.
    pub fn derived_attributes(&self) -> impl Iterator<Item = (&'a str, Value<'a>)> {
        self.attributes()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k, coerce(v)))
    }

    pub fn parent(&self) -> Option<Record<'a>> {
        self.doc.parent(self.id).map(|p| Record::new(self.doc, p))
    }

    pub fn children(&self) -> impl Iterator<Item = Record<'a>> {
        let doc = self.doc;
        doc.children(self.id).iter().map(move |c| Record::new(doc, *c))
    }

    pub fn children_named<'n>(&self, tag: &'n str) -> impl Iterator<Item = Record<'a>> + 'n
    where
        'a: 'n,
    {
        self.children().filter(move |c| c.tag() == tag)
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<Record<'a>> {
        self.children().find(|c| c.tag() == tag)
    }

    /// Follow a chain of child tags, taking the first match at each step.
    pub fn child_path(&self, tags: &[&str]) -> Option<Record<'a>> {
        let mut current = *self;
        for tag in tags {
            current = current.child(tag)?;
        }
        Some(current)
    }

    /// Evaluate a path query; see [`PathQuery`] for the grammar.
    ///
    /// Returns `default` when nothing matches. A malformed path is an error,
    /// never a silent default.
    pub fn query(&self, path: &str, default: Value<'a>) -> Result<Value<'a>, PathError> {
        Ok(PathQuery::parse(path)?.eval(*self, default))
    }

    /// `query(path, Undefined)`.
    pub fn get(&self, path: &str) -> Result<Value<'a>, PathError> {
        self.query(path, Value::Undefined)
    }

    /// Every element matched by `path`, in document order.
    pub fn query_all(&self, path: &str) -> Result<Vec<Record<'a>>, PathError> {
        Ok(PathQuery::parse(path)?.matches(*self))
    }

    /// Plain JSON rendition of this subtree; see the `Serialize` impl.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Records serialize as JSON objects: derived attributes first, then
/// children keyed by tag. Repeated tags become arrays. An attribute sharing
/// a name with a child tag is dropped in favour of the child.
impl Serialize for Record<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut groups: IndexMap<&str, Vec<Record<'_>>> = IndexMap::new();
        for child in self.children() {
            groups.entry(child.tag()).or_default().push(child);
        }

        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.derived_attributes() {
            if !groups.contains_key(name) {
                map.serialize_entry(name, &value)?;
            }
        }
        for (tag, records) in groups.iter() {
            match records.as_slice() {
                [single] => map.serialize_entry(tag, single)?,
                many => map.serialize_entry(tag, many)?,
            }
        }
        map.end()
    }
}
