use crate::error::{ParseError, ParseResult, TokenSpan};
use logos::Logos;
use std::ops::Range;

/// Content-level markup tokens
///
/// Start tags are lexed as one token (the whole `<name a="b" ...>` slice) and
/// split further by [`TagToken`].
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // `<?xml ...?>` and other processing instructions
    #[regex(r"<\?([^?]|\?[^>])*\?>")]
    ProcessingInstruction,

    #[regex(r"<!DOCTYPE[^>]*>")]
    Doctype,

    #[regex(r"<!--([^-]|-[^-])*-->", |lex| {
        let s = lex.slice();
        &s[4..s.len() - 3]
    })]
    Comment(&'src str),

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\][^>])*\]\]>", |lex| {
        let s = lex.slice();
        &s[9..s.len() - 3]
    })]
    CData(&'src str),

    #[regex(
        r#"<[A-Za-z_][A-Za-z0-9_:.\-]*([ \t\r\n]+[A-Za-z_:][A-Za-z0-9_:.\-]*[ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'))*[ \t\r\n]*/?>"#,
        |lex| lex.slice()
    )]
    StartTag(&'src str),

    #[regex(r"</[A-Za-z_][A-Za-z0-9_:.\-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end()
    })]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a single start tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TagToken<'src> {
    #[token("<")]
    Open,

    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Quoted(&'src str),
}

pub type Spanned<T> = (T, Range<usize>);

/// Tokenize a whole document
pub fn tokenize(source: &str) -> ParseResult<Vec<Spanned<Token<'_>>>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(ParseError::LexError {
                    span: TokenSpan::from(lexer.span()),
                })
            }
        }
    }

    Ok(tokens)
}

/// Tokenize the slice of one start tag; spans are shifted by `offset`
pub fn tokenize_tag(slice: &str, offset: usize) -> ParseResult<Vec<Spanned<TagToken<'_>>>> {
    let mut lexer = TagToken::lexer(slice);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let span = (span.start + offset)..(span.end + offset);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(ParseError::LexError { span: span.into() }),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic_document() {
        let source = r#"<?xml version="1.0"?><views><form name="f"/></views>"#;
        let tokens: Vec<_> = tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::ProcessingInstruction,
                Token::StartTag("<views>"),
                Token::StartTag(r#"<form name="f"/>"#),
                Token::EndTag("views"),
            ]
        );
    }

    #[test]
    fn test_tokenize_comment_and_cdata() {
        let source = "<a><!-- note --><![CDATA[x < y]]></a>";
        let tokens: Vec<_> = tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens[1], Token::Comment(" note "));
        assert_eq!(tokens[2], Token::CData("x < y"));
    }

    #[test]
    fn test_tokenize_tag_attributes() {
        let tokens: Vec<_> = tokenize_tag(r#"<field name='age' readonly="true"/>"#, 0)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(
            tokens,
            vec![
                TagToken::Open,
                TagToken::Name("field"),
                TagToken::Name("name"),
                TagToken::Equals,
                TagToken::Quoted("age"),
                TagToken::Name("readonly"),
                TagToken::Equals,
                TagToken::Quoted("true"),
                TagToken::SelfClose,
            ]
        );
    }

    #[test]
    fn test_unterminated_tag_is_lex_error() {
        assert!(matches!(
            tokenize("<views><form name=\"x\""),
            Err(ParseError::LexError { .. })
        ));
    }
}
