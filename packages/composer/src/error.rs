use crate::directives::DirectiveError;
use crate::path::PathError;
use thiserror::Error;
use viewcompose_parser::ParseError;

/// Failures that abort a composition run
///
/// `document` names the base view or the extension that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    #[error("Failed to parse {document}: {source}")]
    Parse { document: String, source: ParseError },

    #[error("No view element found in {document}")]
    ViewNotFound { document: String },

    #[error("Invalid path in {document}: {source}")]
    Path { document: String, source: PathError },

    #[error("Directive failed in {document}: {source}")]
    Directive { document: String, source: DirectiveError },
}

impl ComposeError {
    pub fn document(&self) -> &str {
        match self {
            ComposeError::Parse { document, .. }
            | ComposeError::ViewNotFound { document }
            | ComposeError::Path { document, .. }
            | ComposeError::Directive { document, .. } => document,
        }
    }

    /// Wrap a directive failure that cannot be skipped
    pub fn directive(document: impl Into<String>, error: DirectiveError) -> Self {
        let document = document.into();
        match error {
            DirectiveError::Path(source) => ComposeError::Path { document, source },
            source => ComposeError::Directive { document, source },
        }
    }
}
