use crate::ast::{Attribute, Document, NodeId};
use crate::error::{ParseError, ParseResult, TokenSpan};
use crate::tokenizer::{tokenize, tokenize_tag, Spanned, TagToken, Token};
use std::ops::Range;

/// Open element on the parser stack
struct OpenElement {
    id: NodeId,
    tag: String,
    span: Range<usize>,
}

/// Parser for view markup
pub struct Parser<'src> {
    tokens: Vec<Spanned<Token<'src>>>,
    pos: usize,
    document: Document,
    stack: Vec<OpenElement>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            document: Document::new(),
            stack: Vec::new(),
        })
    }

    /// Parse a complete document with exactly one root element
    pub fn parse_document(mut self) -> ParseResult<Document> {
        while let Some((token, span)) = self.advance() {
            match token {
                Token::ProcessingInstruction | Token::Doctype => {}
                Token::Comment(content) => {
                    let node = self.document.create_comment(content);
                    self.attach(node, span)?;
                }
                Token::CData(content) => {
                    if self.stack.is_empty() {
                        return Err(ParseError::invalid_syntax(
                            span,
                            "CDATA section outside the root element",
                        ));
                    }
                    let node = self.document.create_cdata(content);
                    self.attach(node, span)?;
                }
                Token::Text(raw) => self.parse_text(raw, span)?,
                Token::StartTag(slice) => self.parse_start_tag(slice, span)?,
                Token::EndTag(name) => self.parse_end_tag(name, span)?,
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(ParseError::unexpected_eof(format!("</{}>", open.tag)));
        }
        if self.document.document_element().is_none() {
            return Err(ParseError::unexpected_eof("root element"));
        }

        Ok(self.document)
    }

    fn parse_text(&mut self, raw: &str, span: Range<usize>) -> ParseResult<()> {
        if raw.trim().is_empty() {
            return Ok(());
        }
        if self.stack.is_empty() {
            return Err(ParseError::invalid_syntax(
                span,
                "text outside the root element",
            ));
        }
        let content = decode_entities(raw, span.start)?;
        let node = self.document.create_text(content);
        self.attach(node, span)
    }

    fn parse_start_tag(&mut self, slice: &str, span: Range<usize>) -> ParseResult<()> {
        let tokens = tokenize_tag(slice, span.start)?;
        let mut iter = tokens.into_iter().peekable();

        match iter.next() {
            Some((TagToken::Open, _)) => {}
            other => return Err(unexpected(other, "'<'", &span)),
        }
        let tag = match iter.next() {
            Some((TagToken::Name(name), _)) => name.to_string(),
            other => return Err(unexpected(other, "tag name", &span)),
        };

        let mut attributes: Vec<Attribute> = Vec::new();
        let self_closing = loop {
            match iter.next() {
                Some((TagToken::Close, _)) => break false,
                Some((TagToken::SelfClose, _)) => break true,
                Some((TagToken::Name(name), name_span)) => {
                    match iter.next() {
                        Some((TagToken::Equals, _)) => {}
                        other => return Err(unexpected(other, "'='", &span)),
                    }
                    let value = match iter.next() {
                        Some((TagToken::Quoted(value), value_span)) => {
                            decode_entities(value, value_span.start + 1)?
                        }
                        other => return Err(unexpected(other, "quoted value", &span)),
                    };
                    if attributes.iter().any(|a| a.name == name) {
                        return Err(ParseError::invalid_syntax(
                            name_span,
                            format!("duplicate attribute '{}'", name),
                        ));
                    }
                    attributes.push(Attribute::new(name, value));
                }
                other => return Err(unexpected(other, "attribute or '>'", &span)),
            }
        };

        if self.stack.is_empty() && self.document.document_element().is_some() {
            return Err(ParseError::invalid_syntax(
                span,
                format!("second root element <{}>", tag),
            ));
        }

        let node = self.document.create_element_with(tag.clone(), attributes);
        self.attach(node, span.clone())?;

        if !self_closing {
            self.stack.push(OpenElement { id: node, tag, span });
        }
        Ok(())
    }

    fn parse_end_tag(&mut self, name: &str, span: Range<usize>) -> ParseResult<()> {
        match self.stack.pop() {
            Some(open) if open.tag == name => Ok(()),
            Some(open) => Err(ParseError::MismatchedTag {
                span: span.into(),
                expected: open.tag,
                found: name.to_string(),
            }),
            None => Err(ParseError::unexpected_token(
                span,
                "start tag",
                format!("</{}>", name),
            )),
        }
    }

    fn attach(&mut self, node: NodeId, span: Range<usize>) -> ParseResult<()> {
        let parent = self
            .stack
            .last()
            .map(|open| open.id)
            .unwrap_or_else(|| self.document.root());
        self.document
            .append_child(parent, node)
            .map_err(|e| ParseError::invalid_syntax(span, e.to_string()))
    }

    fn advance(&mut self) -> Option<Spanned<Token<'src>>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Span of the innermost open element, for diagnostics
    pub fn current_span(&self) -> Option<TokenSpan> {
        self.stack.last().map(|open| open.span.clone().into())
    }
}

fn unexpected(
    found: Option<Spanned<TagToken<'_>>>,
    expected: &str,
    tag_span: &Range<usize>,
) -> ParseError {
    match found {
        Some((token, span)) => ParseError::unexpected_token(span, expected, format!("{:?}", token)),
        None => ParseError::unexpected_token(tag_span.clone(), expected, "end of tag"),
    }
}

/// Decode predefined entities and character references
pub fn decode_entities(raw: &str, offset: usize) -> ParseResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut consumed = 0;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or_else(|| {
            ParseError::invalid_syntax(
                (offset + consumed + amp)..(offset + raw.len()),
                "unterminated entity reference",
            )
        })?;
        let entity = &after[..semi];
        let span = (offset + consumed + amp)..(offset + consumed + amp + semi + 2);

        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    ParseError::invalid_syntax(span, format!("unknown entity '&{};'", entity))
                })?
            }
        };
        output.push(decoded);

        let advance = amp + semi + 2;
        consumed += advance;
        rest = &rest[advance..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Parse markup source into a [`Document`]
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source)?.parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_parse_simple_view() {
        let source = r#"
            <object-views>
              <form name="user-form" title="User">
                <panel name="main"/>
              </form>
            </object-views>
        "#;

        let doc = parse(source).unwrap();
        let wrapper = doc.document_element().unwrap();
        assert_eq!(doc.tag(wrapper), Some("object-views"));

        let form = doc.element_children(wrapper)[0];
        assert_eq!(doc.tag(form), Some("form"));
        assert_eq!(doc.attribute(form, "title"), Some("User"));
        // whitespace-only text is dropped
        assert_eq!(doc.children(form).len(), 1);
    }

    #[test]
    fn test_parse_decodes_entities() {
        let doc = parse(r#"<a title="x &amp; y"><b>1 &lt; 2 &#65;&#x42;</b></a>"#).unwrap();
        let a = doc.document_element().unwrap();
        assert_eq!(doc.attribute(a, "title"), Some("x & y"));
        let b = doc.children(a)[0];
        let text = doc.children(b)[0];
        assert_eq!(doc.text(text), Some("1 < 2 AB"));
    }

    #[test]
    fn test_parse_keeps_comments_and_cdata() {
        let doc = parse("<a><!-- c --><![CDATA[<raw>]]></a>").unwrap();
        let a = doc.document_element().unwrap();
        let kinds: Vec<_> = doc.children(a).iter().map(|&c| doc.kind(c).clone()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Comment {
                    content: " c ".to_string()
                },
                NodeKind::CData {
                    content: "<raw>".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("<a><b></a></b>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MismatchedTag { ref expected, ref found, .. } if expected == "b" && found == "a"
        ));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<a><b/>").unwrap_err();
        assert_eq!(err, ParseError::unexpected_eof("</a>"));
    }

    #[test]
    fn test_stray_end_tag() {
        assert!(matches!(
            parse("<a/></b>").unwrap_err(),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_second_root_rejected() {
        assert!(matches!(
            parse("<a/><b/>").unwrap_err(),
            ParseError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(
            parse("  ").unwrap_err(),
            ParseError::unexpected_eof("root element")
        );
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        assert!(matches!(
            parse(r#"<a x="1" x="2"/>"#).unwrap_err(),
            ParseError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_unknown_entity_rejected() {
        assert!(parse("<a>&bogus;</a>").is_err());
    }
}
