//! # Document Tree
//!
//! Arena-backed tree of markup nodes.
//!
//! Every node lives in a single `Vec` owned by its [`Document`] and is
//! addressed by a [`NodeId`]. Parent and child links are stored as ids, so
//! the tree can be mutated in place without reference-counted pointers:
//!
//! ```text
//! Document(#0)
//!   └─ Element <object-views>(#1)
//!        └─ Element <form name="user-form">(#2)
//!             ├─ Element <panel>(#3)
//!             └─ Element <panel-mail>(#4)
//! ```
//!
//! Detached nodes stay in the arena with no parent. They can be inserted
//! again later, which is how moves are expressed.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a node inside one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single `name="value"` pair on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Synthetic document node, always `#0`
    Document,

    /// Element with ordered attributes
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },

    Text { content: String },

    Comment { content: String },

    CData { content: String },
}

/// Node storage: kind plus tree links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Mutable markup document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
        }
    }

    /// The synthetic document node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// First element child of the document node (the wrapper element)
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).into_iter().next()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    /// Tag name, `None` for non-element nodes
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Text of a text or CDATA node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text { content } | NodeKind::CData { content } => Some(content.as_str()),
            _ => None,
        }
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// All descendants in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Attached nodes in document order, starting at the document node
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = vec![self.root()];
        order.extend(self.descendants(self.root()));
        order
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // --- Attributes ---

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, keeping its original position when it already exists
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => {
                let value = value.into();
                match attributes.iter_mut().find(|a| a.name == name) {
                    Some(existing) => existing.value = value,
                    None => attributes.push(Attribute::new(name, value)),
                }
                Ok(())
            }
            _ => Err(TreeError::NotAnElement(id)),
        }
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, TreeError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => {
                let removed = attributes
                    .iter()
                    .position(|a| a.name == name)
                    .map(|index| attributes.remove(index).value);
                Ok(removed)
            }
            _ => Err(TreeError::NotAnElement(id)),
        }
    }

    // --- Construction ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with(
        &mut self,
        tag: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into(),
            attributes,
        })
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text {
            content: content.into(),
        })
    }

    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment {
            content: content.into(),
        })
    }

    pub fn create_cdata(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::CData {
            content: content.into(),
        })
    }

    /// Deep-copy `id` from `other` into this document, returning the detached copy
    pub fn import_node(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.alloc(other.kind(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import_node(other, child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    // --- Mutation primitives ---

    /// Remove `id` from its parent. Detaching an unattached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Remove `id` from its parent, failing when it has none
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if self.parent(id).is_none() {
            return Err(TreeError::NoParent(id));
        }
        self.detach(id);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or last when `None`).
    ///
    /// The child is detached from its current position first, so inserting an
    /// attached node moves it.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        self.check_container(parent)?;
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(TreeError::NotAChild { reference: r, parent });
            }
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle {
                node: child,
                parent,
            });
        }
        self.check_single_root(parent, child, None)?;

        self.detach(child);

        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Put `new` where `old` is; `old` ends up detached
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(TreeError::NoParent(old))?;
        if self.is_ancestor_or_self(new, parent) {
            return Err(TreeError::Cycle { node: new, parent });
        }
        self.check_single_root(parent, new, Some(old))?;

        self.detach(new);

        let children = &mut self.nodes[parent.0].children;
        if let Some(index) = children.iter().position(|&c| c == old) {
            children[index] = new;
        }
        self.nodes[old.0].parent = None;
        self.nodes[new.0].parent = Some(parent);
        Ok(())
    }

    fn check_container(&self, id: NodeId) -> Result<(), TreeError> {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Element { .. } => Ok(()),
            _ => Err(TreeError::CannotHaveChildren(id)),
        }
    }

    /// The document node holds at most one element; `leaving` is about to go
    fn check_single_root(&self, parent: NodeId, node: NodeId, leaving: Option<NodeId>) -> Result<(), TreeError> {
        if !matches!(self.kind(parent), NodeKind::Document) || !self.is_element(node) {
            return Ok(());
        }
        let occupied = self
            .children(parent)
            .iter()
            .any(|&c| c != node && Some(c) != leaving && self.is_element(c));
        if occupied {
            return Err(TreeError::SecondRoot(node));
        }
        Ok(())
    }

    /// Compare the attached subtrees of two nodes, ignoring arena layout
    pub fn subtree_eq(&self, id: NodeId, other: &Document, other_id: NodeId) -> bool {
        if self.kind(id) != other.kind(other_id) {
            return false;
        }
        let ours = self.children(id);
        let theirs = other.children(other_id);
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(&a, &b)| self.subtree_eq(a, other, b))
    }
}

/// Structural equality: same attached tree, regardless of node ids
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root(), other, other.root())
    }
}
