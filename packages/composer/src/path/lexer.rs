//! Lexer for path expressions using logos

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum PathToken<'src> {
    #[token("//")]
    DoubleSlash,

    #[token("/")]
    Slash,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("@")]
    At,

    #[token("=")]
    Equals,

    #[token("!=")]
    NotEquals,

    #[token(",")]
    Comma,

    #[token("..")]
    DotDot,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),

    #[regex(r"[A-Za-z_][A-Za-z0-9_.:\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Literal(&'src str),
}

/// Tokenize a path expression, stopping at the first unrecognized character
pub fn lex(expression: &str) -> Result<Vec<(PathToken<'_>, Range<usize>)>, usize> {
    let mut lexer = PathToken::lexer(expression);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span().start),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_step_with_predicate() {
        let tokens: Vec<_> = lex("panel[@name='main']//field")
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(
            tokens,
            vec![
                PathToken::Name("panel"),
                PathToken::LBracket,
                PathToken::At,
                PathToken::Name("name"),
                PathToken::Equals,
                PathToken::Literal("main"),
                PathToken::RBracket,
                PathToken::DoubleSlash,
                PathToken::Name("field"),
            ]
        );
    }

    #[test]
    fn test_lex_rejects_unknown_character() {
        assert_eq!(lex("panel#main").unwrap_err(), 5);
    }
}
