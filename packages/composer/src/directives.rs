//! # Directives
//!
//! The operations an `extend` block applies to its resolved target.
//!
//! ## Semantics
//!
//! ### Insert
//! - Zone bundles (`toolbar`, `menubar`, `panel-mail` children) are routed to
//!   their zone; everything else is inserted at the target
//! - Several children stay contiguous and in order: the first goes to
//!   `position`, each next one right after the previous
//! - On the view root, leading content lands behind the menubar/toolbar and
//!   trailing content in front of the mail panel
//!
//! ### Replace
//! - With zone bundles: the touched zone is replaced and the other children
//!   follow it
//! - With no children: the target is removed
//! - Otherwise the first child takes the target's place, the rest follow it
//!
//! ### Move
//! - The source is resolved in the document being composed, so it can name
//!   nodes added earlier in the same run
//!
//! ### SetAttribute
//! - An empty value removes the attribute

use crate::adapter::{attribute, filter_by_tag};
use crate::path::{PathError, PathResolver};
use crate::position::Position;
use crate::zones::{MergePolicy, ZoneKind, ZoneLocator};
use serde::Serialize;
use thiserror::Error;
use viewcompose_parser::{Document, NodeId, TreeError};

/// One extend-block item, read from the extension document
///
/// Child ids refer to nodes of that extension document; they are imported
/// into the composed document when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "kebab-case")]
pub enum Directive {
    Insert {
        position: Position,
        children: Vec<NodeId>,
    },
    Replace {
        children: Vec<NodeId>,
    },
    Move {
        source: String,
        position: Position,
    },
    SetAttribute {
        name: String,
        value: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("unknown extension tag: {0}")]
    UnknownTag(String),

    #[error("<{directive}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        directive: &'static str,
        attribute: &'static str,
    },

    #[error("move source not found: {0}")]
    SourceNotFound(String),

    #[error("Can change attributes only on elements: {0}")]
    NotAnElement(NodeId),

    #[error("node {0} is outside the view element")]
    OutsideView(NodeId),

    #[error("the view element cannot be removed")]
    RootRemoval,

    #[error("the view element can only be replaced by one element, got {0}")]
    RootReplacement(usize),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Path(#[from] PathError),
}

impl DirectiveError {
    /// Recoverable errors skip the directive; the rest abort the run
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DirectiveError::Path(_))
    }
}

impl Directive {
    /// Read a directive element (`insert`, `replace`, `move`, `attribute`)
    pub fn from_element(doc: &Document, element: NodeId) -> Result<Self, DirectiveError> {
        let tag = doc.tag(element).ok_or(DirectiveError::NotAnElement(element))?;
        match tag {
            "insert" => Ok(Directive::Insert {
                position: Position::parse(attribute(doc, element, "position")),
                children: doc.element_children(element),
            }),
            "replace" => Ok(Directive::Replace {
                children: doc.element_children(element),
            }),
            "move" => Ok(Directive::Move {
                source: required(doc, element, "move", "source")?,
                position: Position::parse(attribute(doc, element, "position")),
            }),
            "attribute" => Ok(Directive::SetAttribute {
                name: required(doc, element, "attribute", "name")?,
                value: attribute(doc, element, "value").to_string(),
            }),
            other => Err(DirectiveError::UnknownTag(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::Insert { .. } => "insert",
            Directive::Replace { .. } => "replace",
            Directive::Move { .. } => "move",
            Directive::SetAttribute { .. } => "attribute",
        }
    }
}

fn required(
    doc: &Document,
    element: NodeId,
    directive: &'static str,
    name: &'static str,
) -> Result<String, DirectiveError> {
    doc.attribute(element, name)
        .map(str::to_string)
        .ok_or(DirectiveError::MissingAttribute {
            directive,
            attribute: name,
        })
}

/// Split directive children into zone bundles and plain content
///
/// Bundles come out grouped by zone in table order, each group in document
/// order.
pub fn partition_zone_bundles(doc: &Document, children: &[NodeId]) -> (Vec<(ZoneKind, NodeId)>, Vec<NodeId>) {
    let mut bundles = Vec::new();
    for kind in ZoneKind::ALL {
        bundles.extend(
            filter_by_tag(doc, children, kind.tag())
                .into_iter()
                .map(|c| (kind, c)),
        );
    }
    let rest = children
        .iter()
        .copied()
        .filter(|&c| doc.tag(c).and_then(ZoneKind::from_tag).is_none())
        .collect();
    (bundles, rest)
}

/// Mutable view of the document being composed
pub struct DirectiveContext<'a> {
    doc: &'a mut Document,
    view_root: &'a mut NodeId,
    resolver: &'a PathResolver,
}

impl<'a> DirectiveContext<'a> {
    pub fn new(doc: &'a mut Document, view_root: &'a mut NodeId, resolver: &'a PathResolver) -> Self {
        Self {
            doc,
            view_root,
            resolver,
        }
    }

    fn zones(&self) -> ZoneLocator<'a> {
        ZoneLocator::new(self.resolver)
    }

    fn is_view_root(&self, node: NodeId) -> bool {
        node == *self.view_root
    }

    /// Whether `node` is the view element or inside it
    fn in_view(&self, node: NodeId) -> bool {
        self.doc.is_ancestor_or_self(*self.view_root, node)
    }

    /// Apply `directive` to `target`; `source` is the extension document
    ///
    /// Targets outside the view element (the wrapper, the document node) are
    /// rejected so the document never gains a second root.
    pub fn apply(&mut self, source: &Document, directive: &Directive, target: NodeId) -> Result<(), DirectiveError> {
        if !self.in_view(target) {
            return Err(DirectiveError::OutsideView(target));
        }
        match directive {
            Directive::Insert { position, children } => self.insert(source, *position, children, target),
            Directive::Replace { children } => self.replace(source, children, target),
            Directive::Move {
                source: path,
                position,
            } => self.move_node(path, *position, target),
            Directive::SetAttribute { name, value } => self.set_attribute(name, value, target),
        }
    }

    pub fn insert(
        &mut self,
        source: &Document,
        position: Position,
        children: &[NodeId],
        target: NodeId,
    ) -> Result<(), DirectiveError> {
        let (bundles, rest) = partition_zone_bundles(source, children);
        for (kind, bundle) in bundles {
            self.insert_zone(source, kind, bundle)?;
        }

        if rest.is_empty() {
            return Ok(());
        }

        let (target, position) = if self.is_view_root(target) {
            self.root_anchor(position)?
        } else {
            (target, position)
        };
        let nodes = self.import(source, &rest);
        self.insert_chain(&nodes, position, target)?;
        Ok(())
    }

    pub fn replace(&mut self, source: &Document, children: &[NodeId], target: NodeId) -> Result<(), DirectiveError> {
        let (bundles, rest) = partition_zone_bundles(source, children);
        let mut touched = None;
        for (kind, bundle) in bundles {
            touched = Some(self.replace_zone(source, kind, bundle)?);
        }

        let nodes = self.import(source, &rest);
        match touched {
            Some(zone) => {
                self.insert_chain(&nodes, Position::After, zone)?;
            }
            None => {
                self.replace_with(&nodes, target)?;
            }
        }
        Ok(())
    }

    pub fn move_node(&mut self, path: &str, position: Position, target: NodeId) -> Result<(), DirectiveError> {
        let node = self
            .resolver
            .resolve(path, self.doc)?
            .ok_or_else(|| DirectiveError::SourceNotFound(path.to_string()))?;
        if !self.in_view(node) {
            return Err(DirectiveError::OutsideView(node));
        }

        let position = if self.is_view_root(target) {
            position.redirect_for_root()
        } else {
            position
        };
        position.insert(self.doc, target, node)?;
        Ok(())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str, target: NodeId) -> Result<(), DirectiveError> {
        if !self.doc.is_element(target) {
            return Err(DirectiveError::NotAnElement(target));
        }
        if value.is_empty() {
            self.doc.remove_attribute(target, name)?;
        } else {
            self.doc.set_attribute(target, name, value)?;
        }
        Ok(())
    }

    // --- zones ---

    fn insert_zone(&mut self, source: &Document, kind: ZoneKind, bundle: NodeId) -> Result<NodeId, DirectiveError> {
        match self.zones().locate(kind, self.doc)? {
            Some(zone) => self.merge_zone(source, kind.spec().on_insert, bundle, zone),
            None => self.create_zone(source, kind, bundle),
        }
    }

    fn replace_zone(&mut self, source: &Document, kind: ZoneKind, bundle: NodeId) -> Result<NodeId, DirectiveError> {
        match self.zones().locate(kind, self.doc)? {
            Some(zone) => self.merge_zone(source, kind.spec().on_replace, bundle, zone),
            None => self.create_zone(source, kind, bundle),
        }
    }

    /// Returns the zone element afterwards
    fn merge_zone(
        &mut self,
        source: &Document,
        policy: MergePolicy,
        bundle: NodeId,
        zone: NodeId,
    ) -> Result<NodeId, DirectiveError> {
        match policy {
            MergePolicy::AppendChildren => {
                let items = self.import(source, &source.element_children(bundle));
                self.insert_chain(&items, Position::InsideLast, zone)?;
                Ok(zone)
            }
            MergePolicy::ReplaceZone => {
                let node = self.doc.import_node(source, bundle);
                self.doc.replace_child(zone, node)?;
                Ok(node)
            }
        }
    }

    fn create_zone(&mut self, source: &Document, kind: ZoneKind, bundle: NodeId) -> Result<NodeId, DirectiveError> {
        let (anchor, position) = self.zones().fallback_anchor(kind, self.doc, *self.view_root)?;
        let node = self.doc.import_node(source, bundle);
        position.insert(self.doc, anchor, node)?;
        Ok(node)
    }

    /// Target and position for plain content inserted at the view root
    fn root_anchor(&self, position: Position) -> Result<(NodeId, Position), DirectiveError> {
        let zones = self.zones();
        let anchor = match position.redirect_for_root() {
            Position::InsideFirst => zones
                .leading_anchor(&*self.doc)?
                .map(|zone| (zone, Position::After)),
            _ => zones
                .trailing_anchor(&*self.doc)?
                .map(|zone| (zone, Position::Before)),
        };
        Ok(anchor.unwrap_or((*self.view_root, position.redirect_for_root())))
    }

    // --- helpers ---

    fn import(&mut self, source: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes.iter().map(|&n| self.doc.import_node(source, n)).collect()
    }

    /// Insert `nodes` as one contiguous run, returning the last one
    fn insert_chain(
        &mut self,
        nodes: &[NodeId],
        position: Position,
        target: NodeId,
    ) -> Result<Option<NodeId>, DirectiveError> {
        let Some((&first, others)) = nodes.split_first() else {
            return Ok(None);
        };
        position.insert(self.doc, target, first)?;
        let mut last = first;
        for &node in others {
            Position::After.insert(self.doc, last, node)?;
            last = node;
        }
        Ok(Some(last))
    }

    /// Replace `target` by `nodes`; an empty list removes it
    fn replace_with(&mut self, nodes: &[NodeId], target: NodeId) -> Result<Option<NodeId>, DirectiveError> {
        if self.is_view_root(target) {
            match nodes.len() {
                0 => return Err(DirectiveError::RootRemoval),
                1 => {}
                n => return Err(DirectiveError::RootReplacement(n)),
            }
        }

        let Some((&first, others)) = nodes.split_first() else {
            self.doc.remove(target)?;
            return Ok(None);
        };

        self.doc.replace_child(target, first)?;
        if self.is_view_root(target) {
            *self.view_root = first;
        }
        Ok(self.insert_chain(others, Position::After, first)?.or(Some(first)))
    }
}
