use crate::directives::DirectiveError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    TargetNotFound,
    SourceNotFound,
    UnknownDirective,
    MissingAttribute,
    NotAnElement,
    OutsideView,
    InvalidTree,
    InvalidPath,
}

impl From<&DirectiveError> for DiagnosticKind {
    fn from(error: &DirectiveError) -> Self {
        match error {
            DirectiveError::UnknownTag(_) => DiagnosticKind::UnknownDirective,
            DirectiveError::MissingAttribute { .. } => DiagnosticKind::MissingAttribute,
            DirectiveError::SourceNotFound(_) => DiagnosticKind::SourceNotFound,
            DirectiveError::NotAnElement(_) => DiagnosticKind::NotAnElement,
            DirectiveError::OutsideView(_) => DiagnosticKind::OutsideView,
            DirectiveError::RootRemoval
            | DirectiveError::RootReplacement(_)
            | DirectiveError::Tree(_) => DiagnosticKind::InvalidTree,
            DirectiveError::Path(_) => DiagnosticKind::InvalidPath,
        }
    }
}

/// A skipped block or directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Label of the extension that contributed it
    pub extension: String,
    /// The extend block's target path
    pub target: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        extension: impl Into<String>,
        target: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            extension: extension.into(),
            target: target.into(),
            kind,
            message: message.into(),
        }
    }
}
