//! # ViewCompose Parser
//!
//! Markup front end for view documents:
//!
//! ```text
//! source text ──tokenizer──▶ tokens ──parser──▶ Document (arena tree)
//!                                                   │
//!                                        serializer ▼
//!                                              markup text
//! ```
//!
//! The [`Document`] tree is the mutable working model the composer patches.

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Attribute, Document, NodeData, NodeId, NodeKind};
pub use error::{ParseError, ParseResult, TokenSpan, TreeError};
pub use parser::{parse, Parser};
pub use serializer::{serialize, serialize_pretty, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(feature = "pretty-errors")]
pub use error::format_error;
