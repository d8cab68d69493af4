//! Error types for the markup parser and tree primitives

use crate::ast::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Byte range of a token in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<std::ops::Range<usize>> for TokenSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Parse error with location and context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token at {span:?}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: TokenSpan,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Mismatched end tag at {span:?}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        span: TokenSpan,
        expected: String,
        found: String,
    },

    #[error("Invalid syntax at {span:?}: {message}")]
    InvalidSyntax { span: TokenSpan, message: String },

    #[error("Lexer error at {span:?}")]
    LexError { span: TokenSpan },
}

impl ParseError {
    pub fn unexpected_token(
        span: impl Into<TokenSpan>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span: span.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: impl Into<TokenSpan>, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span: span.into(),
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<TokenSpan> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::MismatchedTag { span, .. } => Some(*span),
            ParseError::InvalidSyntax { span, .. } => Some(*span),
            ParseError::LexError { span } => Some(*span),
        }
    }
}

/// Failures of the primitive tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Node {reference} is not a child of {parent}")]
    NotAChild { reference: NodeId, parent: NodeId },

    #[error("Inserting {node} into {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("Node {0} cannot have children")]
    CannotHaveChildren(NodeId),

    #[error("Document already has a root element, cannot add {0}")]
    SecondRoot(NodeId),
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.span().unwrap_or(TokenSpan {
        start: source.len().saturating_sub(1),
        end: source.len(),
    });

    let report = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_color(Color::Red)
                .with_message(match error {
                    ParseError::UnexpectedToken { expected, .. }
                    | ParseError::UnexpectedEof { expected } => format!("expected {}", expected),
                    ParseError::MismatchedTag { expected, .. } => {
                        format!("expected </{}>", expected)
                    }
                    ParseError::InvalidSyntax { message, .. } => message.clone(),
                    ParseError::LexError { .. } => "unrecognized markup".to_string(),
                }),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}
