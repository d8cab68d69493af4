//! # Zones
//!
//! Three well-known children of a view collect contributions from many
//! modules instead of being duplicated:
//!
//! | Zone         | Tag          | Created at                                  |
//! |--------------|--------------|---------------------------------------------|
//! | `Toolbar`    | `toolbar`    | after the menubar, else first child         |
//! | `Menubar`    | `menubar`    | after the toolbar, else first child         |
//! | `PanelMail`  | `panel-mail` | last child                                  |
//!
//! Behaviour per zone lives in the [`ZONES`] table; handlers only consult it.

use crate::path::{PathError, PathResolver};
use crate::position::Position;
use serde::Serialize;
use viewcompose_parser::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneKind {
    Toolbar,
    Menubar,
    PanelMail,
}

/// Where a zone is created when the view does not have it yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Right after `neighbour` when it exists, otherwise first child of the view
    FirstChildAfter(ZoneKind),
    LastChild,
}

/// What happens to a bundle when its zone already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The bundle's element children are appended to the zone
    AppendChildren,
    /// The bundle element takes the zone's place
    ReplaceZone,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneSpec {
    pub kind: ZoneKind,
    pub tag: &'static str,
    pub placement: Placement,
    pub on_insert: MergePolicy,
    pub on_replace: MergePolicy,
}

/// Dispatch table, in the order bundles are processed
pub const ZONES: [ZoneSpec; 3] = [
    ZoneSpec {
        kind: ZoneKind::Toolbar,
        tag: "toolbar",
        placement: Placement::FirstChildAfter(ZoneKind::Menubar),
        on_insert: MergePolicy::AppendChildren,
        on_replace: MergePolicy::ReplaceZone,
    },
    ZoneSpec {
        kind: ZoneKind::Menubar,
        tag: "menubar",
        placement: Placement::FirstChildAfter(ZoneKind::Toolbar),
        on_insert: MergePolicy::AppendChildren,
        on_replace: MergePolicy::ReplaceZone,
    },
    ZoneSpec {
        kind: ZoneKind::PanelMail,
        tag: "panel-mail",
        placement: Placement::LastChild,
        on_insert: MergePolicy::AppendChildren,
        on_replace: MergePolicy::ReplaceZone,
    },
];

impl ZoneKind {
    pub const ALL: [ZoneKind; 3] = [ZoneKind::Toolbar, ZoneKind::Menubar, ZoneKind::PanelMail];

    pub fn spec(self) -> &'static ZoneSpec {
        match self {
            ZoneKind::Toolbar => &ZONES[0],
            ZoneKind::Menubar => &ZONES[1],
            ZoneKind::PanelMail => &ZONES[2],
        }
    }

    pub fn tag(self) -> &'static str {
        self.spec().tag
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        ZONES.iter().find(|z| z.tag == tag).map(|z| z.kind)
    }
}

/// Finds zones of one view through the path resolver
pub struct ZoneLocator<'r> {
    resolver: &'r PathResolver,
}

impl<'r> ZoneLocator<'r> {
    pub fn new(resolver: &'r PathResolver) -> Self {
        Self { resolver }
    }

    /// The zone element directly under the view root, if any
    pub fn locate(&self, kind: ZoneKind, doc: &Document) -> Result<Option<NodeId>, PathError> {
        self.resolver.resolve(kind.tag(), doc)
    }

    /// Target and position for creating a zone that does not exist yet
    pub fn fallback_anchor(
        &self,
        kind: ZoneKind,
        doc: &Document,
        view_root: NodeId,
    ) -> Result<(NodeId, Position), PathError> {
        match kind.spec().placement {
            Placement::FirstChildAfter(neighbour) => Ok(match self.locate(neighbour, doc)? {
                Some(zone) => (zone, Position::After),
                None => (view_root, Position::InsideFirst),
            }),
            Placement::LastChild => Ok((view_root, Position::InsideLast)),
        }
    }

    /// Zone that leading content must follow: the menubar, else the toolbar
    pub fn leading_anchor(&self, doc: &Document) -> Result<Option<NodeId>, PathError> {
        match self.locate(ZoneKind::Menubar, doc)? {
            Some(menubar) => Ok(Some(menubar)),
            None => self.locate(ZoneKind::Toolbar, doc),
        }
    }

    /// Zone that trailing content must precede: the mail panel
    pub fn trailing_anchor(&self, doc: &Document) -> Result<Option<NodeId>, PathError> {
        self.locate(ZoneKind::PanelMail, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{PathCache, ViewIdentity};
    use std::sync::Arc;
    use viewcompose_parser::parse;

    fn resolver() -> PathResolver {
        PathResolver::new(
            ViewIdentity::new("f", "form"),
            Arc::new(PathCache::with_capacity(16)),
        )
    }

    fn root_of(doc: &Document) -> NodeId {
        doc.element_children(doc.document_element().unwrap())[0]
    }

    #[test]
    fn test_table_lookup() {
        for kind in ZoneKind::ALL {
            assert_eq!(kind.spec().kind, kind);
            assert_eq!(ZoneKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ZoneKind::from_tag("panel"), None);
    }

    #[test]
    fn test_locate_only_direct_children() {
        let doc = parse(
            r#"<object-views><form name="f"><panel><toolbar/></panel><menubar/></form></object-views>"#,
        )
        .unwrap();
        let resolver = resolver();
        let zones = ZoneLocator::new(&resolver);
        assert_eq!(zones.locate(ZoneKind::Toolbar, &doc).unwrap(), None);
        let menubar = zones.locate(ZoneKind::Menubar, &doc).unwrap().unwrap();
        assert_eq!(doc.parent(menubar), Some(root_of(&doc)));
    }

    #[test]
    fn test_fallback_anchors() {
        let resolver = resolver();
        let zones = ZoneLocator::new(&resolver);

        let empty = parse(r#"<object-views><form name="f"><panel/></form></object-views>"#).unwrap();
        let root = root_of(&empty);
        assert_eq!(
            zones.fallback_anchor(ZoneKind::Toolbar, &empty, root).unwrap(),
            (root, Position::InsideFirst)
        );
        assert_eq!(
            zones.fallback_anchor(ZoneKind::PanelMail, &empty, root).unwrap(),
            (root, Position::InsideLast)
        );

        let with_toolbar =
            parse(r#"<object-views><form name="f"><toolbar/><panel/></form></object-views>"#).unwrap();
        let root = root_of(&with_toolbar);
        let toolbar = with_toolbar.element_children(root)[0];
        assert_eq!(
            zones.fallback_anchor(ZoneKind::Menubar, &with_toolbar, root).unwrap(),
            (toolbar, Position::After)
        );
        assert_eq!(zones.leading_anchor(&with_toolbar).unwrap(), Some(toolbar));
        assert_eq!(zones.trailing_anchor(&with_toolbar).unwrap(), None);
    }
}
