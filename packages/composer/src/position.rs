//! Relative insertion positions

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use viewcompose_parser::{Document, NodeId, TreeError};

/// Where a node goes relative to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    Before,
    #[default]
    After,
    InsideFirst,
    InsideLast,
}

impl Position {
    /// Parse a `position` attribute; unknown or empty values mean `After`
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "before" => Position::Before,
            "after" => Position::After,
            "inside-first" => Position::InsideFirst,
            "inside" | "inside-last" => Position::InsideLast,
            _ => Position::After,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Before => "before",
            Position::After => "after",
            Position::InsideFirst => "inside-first",
            Position::InsideLast => "inside-last",
        }
    }

    /// Parent to insert into and the sibling to insert before (`None` = at the end)
    pub fn anchor(self, doc: &Document, target: NodeId) -> Result<(NodeId, Option<NodeId>), TreeError> {
        match self {
            Position::Before => {
                let parent = doc.parent(target).ok_or(TreeError::NoParent(target))?;
                Ok((parent, Some(target)))
            }
            Position::After => {
                let parent = doc.parent(target).ok_or(TreeError::NoParent(target))?;
                Ok((parent, doc.next_sibling(target)))
            }
            Position::InsideFirst => Ok((target, doc.first_child(target))),
            Position::InsideLast => Ok((target, None)),
        }
    }

    /// Insert `node` relative to `target`, detaching it from wherever it was
    pub fn insert(self, doc: &mut Document, target: NodeId, node: NodeId) -> Result<(), TreeError> {
        let (parent, reference) = self.anchor(doc, target)?;
        doc.insert_before(parent, node, reference)
    }

    /// Position to use when the target is the view root
    ///
    /// Sibling positions would put content next to the view element, so they
    /// become the matching inside position.
    pub fn redirect_for_root(self) -> Self {
        match self {
            Position::Before | Position::InsideFirst => Position::InsideFirst,
            Position::After | Position::InsideLast => Position::InsideLast,
        }
    }
}

impl FromStr for Position {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Position::parse(s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
