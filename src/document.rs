// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Arena storage for record trees.
//!
//! A [`Document`] owns every node of one record tree in a flat vector and
//! addresses them by [`NodeId`]. Children are kept as ordered id lists, so
//! appending a child while a walk holds ids of other nodes never invalidates
//! them. Subtrees of another document are brought in with
//! [`Document::import`], which deep-copies them; nothing in a document ever
//! points into a different document.

use crate::record::Record;

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Index of a node inside the [`Document`] that created it.
///
/// Ids are only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            children: vec![],
            parent: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to parse xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("document exceeds maximum node count {0}")]
    TooLarge(usize),
    #[error("node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),
    #[error("node {0:?} is the document root")]
    Root(NodeId),
    #[error("node {0:?} does not belong to this document")]
    UnknownNode(NodeId),
}

/// Arena of elements.
///
/// # Panics
///
/// The read accessors taking a [`NodeId`] (`tag`, `attribute`, `attributes`,
/// `children`, `parent`) panic when given an id this document did not issue.
/// Use [`Document::record`] to check an id first. Mutating calls return
/// [`DocumentError::UnknownNode`] instead.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document holding a single root element.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node::new(root_tag)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// View of the root element.
    pub fn root_record(&self) -> Record<'_> {
        Record::new(self, self.root)
    }

    /// View of any node of this document.
    pub fn record(&self, id: NodeId) -> Option<Record<'_>> {
        if id.index() < self.nodes.len() {
            Some(Record::new(self, id))
        } else {
            None
        }
    }

    /// Number of nodes, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].tag
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(DocumentError::UnknownNode(id))
    }

    /// Rename an element.
    pub fn set_tag(&mut self, id: NodeId, tag: &str) -> Result<(), DocumentError> {
        self.node_mut(id)?.tag = tag.to_string();
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.index()]
            .attributes
            .get(name)
            .map(String::as_str)
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes[id.index()]
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, keeping its original position if it already exists.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        self.node_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    fn push_node(&mut self, node: Node) -> Result<NodeId, DocumentError> {
        let idx = self.nodes.len();
        let id = u32::try_from(idx).map_err(|_| DocumentError::TooLarge(u32::MAX as usize))?;
        self.nodes.push(node);
        Ok(NodeId(id))
    }

    /// Create a detached element. It becomes part of the tree once appended.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId, DocumentError> {
        self.push_node(Node::new(tag))
    }

    /// Create an element and append it as the last child of `parent`.
    pub fn add_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError> {
        let id = self.create_element(tag)?;
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        if child == self.root {
            return Err(DocumentError::Root(child));
        }
        self.node_mut(parent)?;
        let node = self.node_mut(child)?;
        if node.parent.is_some() {
            return Err(DocumentError::AlreadyAttached(child));
        }
        node.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Deep-copy `source` (a node of another document) into this document.
    ///
    /// The copy is detached; append it to make it part of the tree. The
    /// copy's tag, attributes and child order match the source.
    pub fn import(&mut self, source: Record<'_>) -> Result<NodeId, DocumentError> {
        let top = self.push_node(Node::new(source.tag()))?;
        let mut stack = vec![(source, top)];
        while let Some((src, dst)) = stack.pop() {
            for (name, value) in src.attributes() {
                self.set_attribute(dst, name, value)?;
            }
            let mut pending = vec![];
            for child in src.children() {
                let id = self.push_node(Node::new(child.tag()))?;
                self.nodes[id.index()].parent = Some(dst);
                self.nodes[dst.index()].children.push(id);
                pending.push((child, id));
            }
            // Order of the stack only affects arena layout, not child order.
            stack.extend(pending.into_iter().rev());
        }
        Ok(top)
    }

    /// Ids of `id` and all nodes below it, in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().cloned());
        }
        out
    }

    /// Build a document from xml text. Text and comment nodes are dropped;
    /// records carry all their data in attributes.
    pub fn from_xml_str(xml: &str) -> Result<Document, DocumentError> {
        let parsed = roxmltree::Document::parse(xml)?;
        let root = parsed.root_element();

        let mut doc = Document::new(root.tag_name().name());
        let mut stack = vec![(root, doc.root())];
        while let Some((src, dst)) = stack.pop() {
            for attr in src.attributes() {
                doc.set_attribute(dst, attr.name(), attr.value())?;
            }
            let mut pending = vec![];
            for child in src.children().filter(|n| n.is_element()) {
                let id = doc.add_element(dst, child.tag_name().name())?;
                pending.push((child, id));
            }
            stack.extend(pending.into_iter().rev());
        }
        Ok(doc)
    }

    pub fn from_xml_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Document::from_xml_str(&contents)
            .with_context(|| format!("Failed to load record {}", path.display()))
    }
}
