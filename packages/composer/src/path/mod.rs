//! # Path Resolver
//!
//! Resolves slash-separated paths relative to one view of a document.
//!
//! A path such as `panel[@name='main']/field` is first rewritten into an
//! absolute expression scoped to the view identity:
//!
//! ```text
//! panel[@name='main']/field
//!   ──▶ /*/form[@name='user-form']/panel[@name='main']/field
//! ```
//!
//! The rewritten string is the cache key. Compilation and evaluation go
//! through [`PathCache`], which is usually the process-wide instance.

mod cache;
mod compile;
mod eval;
mod lexer;

pub use cache::{CachedPath, PathCache, DEFAULT_CAPACITY};
pub use compile::{compile, Axis, CompiledPath, Expr, NodeTest, Predicate, Step};
pub use eval::EvalScratch;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use viewcompose_parser::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Invalid path expression '{expression}' at offset {offset}: {message}")]
    Syntax {
        expression: String,
        offset: usize,
        message: String,
    },
}

/// Name and type of the view a path is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewIdentity {
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
}

impl ViewIdentity {
    pub fn new(name: impl Into<String>, view_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            view_type: view_type.into(),
        }
    }
}

impl fmt::Display for ViewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.view_type)
    }
}

/// Rewrite a view-relative path into an absolute expression
///
/// One leading `/` is stripped, so `//field` searches all descendants of the
/// view. An empty path addresses the view element itself.
pub fn scoped_expression(path: &str, view: &ViewIdentity) -> String {
    let root = format!("/*/{}[@name='{}']", view.view_type, view.name);
    let relative = path.strip_prefix('/').unwrap_or(path);
    if relative.is_empty() {
        root
    } else {
        format!("{}/{}", root, relative)
    }
}

/// Resolves view-relative paths against documents of one view
#[derive(Debug, Clone)]
pub struct PathResolver {
    view: ViewIdentity,
    cache: Arc<PathCache>,
}

impl PathResolver {
    pub fn new(view: ViewIdentity, cache: Arc<PathCache>) -> Self {
        Self { view, cache }
    }

    /// Resolver backed by [`PathCache::global`]
    pub fn with_global_cache(view: ViewIdentity) -> Self {
        Self::new(view, PathCache::global())
    }

    pub fn view(&self) -> &ViewIdentity {
        &self.view
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    /// First node matching `path`, or `None` when nothing matches
    pub fn resolve(&self, path: &str, doc: &Document) -> Result<Option<NodeId>, PathError> {
        let expression = scoped_expression(path, &self.view);
        let cached = self.cache.get_or_compile(&expression)?;
        Ok(cached.first(doc))
    }

    /// Every node matching `path`, in document order
    pub fn resolve_all(&self, path: &str, doc: &Document) -> Result<Vec<NodeId>, PathError> {
        let expression = scoped_expression(path, &self.view);
        let cached = self.cache.get_or_compile(&expression)?;
        Ok(cached.all(doc))
    }
}
