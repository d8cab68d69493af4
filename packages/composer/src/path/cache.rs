//! Bounded cache of compiled path expressions
//!
//! Two locks are involved:
//!
//! ```text
//! PathCache.entries (Mutex<LruCache>)     lookup + compile + insert, process wide
//!   └─ CachedPath.scratch (Mutex)         evaluation of one expression
//! ```
//!
//! The entry lock is never held while the cache lock is taken, so a slow
//! evaluation only blocks other users of the same expression string.

use super::compile::{compile, CompiledPath};
use super::eval::EvalScratch;
use super::PathError;
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;
use viewcompose_parser::{Document, NodeId};

/// Default number of compiled expressions kept
pub const DEFAULT_CAPACITY: usize = 10_000;

static GLOBAL: Lazy<Arc<PathCache>> = Lazy::new(|| Arc::new(PathCache::default()));

/// A compiled expression shared between composition runs
#[derive(Debug)]
pub struct CachedPath {
    expression: String,
    compiled: CompiledPath,
    scratch: Mutex<EvalScratch>,
}

impl CachedPath {
    fn new(expression: String, compiled: CompiledPath) -> Self {
        Self {
            expression,
            compiled,
            scratch: Mutex::new(EvalScratch::default()),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn compiled(&self) -> &CompiledPath {
        &self.compiled
    }

    /// First match in document order, evaluated from the document node
    pub fn first(&self, doc: &Document) -> Option<NodeId> {
        let mut scratch = self.scratch.lock();
        self.compiled.select_first(doc, doc.root(), &mut scratch)
    }

    /// Every match in document order, evaluated from the document node
    pub fn all(&self, doc: &Document) -> Vec<NodeId> {
        let mut scratch = self.scratch.lock();
        self.compiled.select(doc, doc.root(), &mut scratch)
    }
}

/// LRU cache keyed by the full (scoped) expression string
pub struct PathCache {
    entries: Mutex<LruCache<String, Arc<CachedPath>>>,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for PathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("PathCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish()
    }
}

impl PathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// A capacity of zero is bumped to one
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
    }

    /// Process-wide cache shared by every resolver that does not bring its own
    pub fn global() -> Arc<PathCache> {
        Arc::clone(&GLOBAL)
    }

    /// Look up `expression`, compiling and inserting it on a miss
    ///
    /// Compilation happens while the cache lock is held. Failed compilations
    /// are not cached; the same error comes back on every call.
    pub fn get_or_compile(&self, expression: &str) -> Result<Arc<CachedPath>, PathError> {
        let mut entries = self.entries.lock();
        if let Some(cached) = entries.get(expression) {
            return Ok(Arc::clone(cached));
        }

        trace!(expression, "compiling path expression");
        let compiled = compile(expression)?;
        let cached = Arc::new(CachedPath::new(expression.to_string(), compiled));
        entries.put(expression.to_string(), Arc::clone(&cached));
        Ok(cached)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Whether `expression` is cached, without touching its recency
    pub fn contains(&self, expression: &str) -> bool {
        self.entries.lock().contains(expression)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
