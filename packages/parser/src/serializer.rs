use crate::ast::{Document, NodeId, NodeKind};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serializer converts a document tree back to markup
///
/// Compact mode writes nodes back to back. Pretty mode indents element-only
/// content and keeps mixed content (elements next to text) on one line so
/// text is never altered.
pub struct Serializer {
    indent_string: String,
    pretty: bool,
    declaration: bool,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_string: String::new(),
            pretty: false,
            declaration: false,
        }
    }

    pub fn pretty() -> Self {
        Self::with_indent("  ") // 2 spaces
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_string: indent.to_string(),
            pretty: true,
            declaration: false,
        }
    }

    /// Emit an `<?xml ...?>` declaration before the document
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Serialize a whole document
    pub fn serialize(&self, doc: &Document) -> String {
        let mut output = String::new();

        if self.declaration {
            output.push_str(XML_DECLARATION);
            if self.pretty {
                output.push('\n');
            }
        }

        for &child in doc.children(doc.root()) {
            self.write_node(doc, child, 0, &mut output);
            if self.pretty {
                output.push('\n');
            }
        }

        output
    }

    /// Serialize one node and its subtree
    pub fn serialize_node(&self, doc: &Document, id: NodeId) -> String {
        let mut output = String::new();
        self.write_node(doc, id, 0, &mut output);
        output
    }

    fn write_node(&self, doc: &Document, id: NodeId, depth: usize, output: &mut String) {
        match doc.kind(id) {
            NodeKind::Document => {
                for &child in doc.children(id) {
                    self.write_node(doc, child, depth, output);
                }
            }
            NodeKind::Element { tag, attributes } => {
                output.push('<');
                output.push_str(tag);
                for attribute in attributes {
                    output.push(' ');
                    output.push_str(&attribute.name);
                    output.push_str("=\"");
                    escape_into(&attribute.value, true, output);
                    output.push('"');
                }

                let children = doc.children(id);
                if children.is_empty() {
                    output.push_str("/>");
                    return;
                }
                output.push('>');

                let block = self.pretty
                    && children
                        .iter()
                        .all(|&c| !matches!(doc.kind(c), NodeKind::Text { .. } | NodeKind::CData { .. }));

                for &child in children {
                    if block {
                        output.push('\n');
                        self.indent(depth + 1, output);
                    }
                    self.write_node(doc, child, depth + 1, output);
                }

                if block {
                    output.push('\n');
                    self.indent(depth, output);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeKind::Text { content } => escape_into(content, false, output),
            NodeKind::Comment { content } => {
                output.push_str("<!--");
                output.push_str(content);
                output.push_str("-->");
            }
            NodeKind::CData { content } => {
                output.push_str("<![CDATA[");
                output.push_str(content);
                output.push_str("]]>");
            }
        }
    }

    fn indent(&self, depth: usize, output: &mut String) {
        for _ in 0..depth {
            output.push_str(&self.indent_string);
        }
    }
}

fn escape_into(value: &str, attribute: bool, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' if attribute => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}

/// Compact serialization of a whole document
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Indented serialization of a whole document
pub fn serialize_pretty(doc: &Document) -> String {
    Serializer::pretty().serialize(doc)
}
