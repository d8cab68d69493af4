//! Read-only helpers over the document tree

use thiserror::Error;
use viewcompose_parser::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Document has no view element")]
pub struct ViewNotFound;

/// Element children of `node`, in order
pub fn child_elements(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.element_children(node)
}

/// Elements with tag `tag`, keeping their order
pub fn filter_by_tag(doc: &Document, elements: &[NodeId], tag: &str) -> Vec<NodeId> {
    elements
        .iter()
        .copied()
        .filter(|&e| doc.tag(e) == Some(tag))
        .collect()
}

/// The view element: first element child of the wrapper root
pub fn view_root(doc: &Document) -> Result<NodeId, ViewNotFound> {
    doc.document_element()
        .and_then(|wrapper| doc.element_children(wrapper).into_iter().next())
        .ok_or(ViewNotFound)
}

/// Attribute value, or an empty string when absent
pub fn attribute<'d>(doc: &'d Document, node: NodeId, name: &str) -> &'d str {
    doc.attribute(node, name).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewcompose_parser::parse;

    #[test]
    fn test_view_root_and_children() {
        let doc = parse(
            r#"<object-views><form name="f"><toolbar/><panel/>text<toolbar/></form></object-views>"#,
        )
        .unwrap();
        let root = view_root(&doc).unwrap();
        assert_eq!(doc.tag(root), Some("form"));

        let children = child_elements(&doc, root);
        assert_eq!(children.len(), 3);
        assert_eq!(filter_by_tag(&doc, &children, "toolbar"), vec![children[0], children[2]]);
    }

    #[test]
    fn test_view_root_missing() {
        let doc = parse("<object-views>only text</object-views>").unwrap();
        assert_eq!(view_root(&doc), Err(ViewNotFound));
    }

    #[test]
    fn test_attribute_defaults_to_empty() {
        let doc = parse(r#"<object-views><form name="f"/></object-views>"#).unwrap();
        let root = view_root(&doc).unwrap();
        assert_eq!(attribute(&doc, root, "name"), "f");
        assert_eq!(attribute(&doc, root, "title"), "");
    }
}
