//! # Composition Orchestrator
//!
//! Applies an ordered list of extensions to one base view:
//!
//! ```text
//! base xml ──parse──▶ Document ──┬─ extension 1 ─┬─ extend ─▶ guards ─▶ target ─▶ directives
//!                                │               └─ other  ─▶ append (before panel-mail)
//!                                ├─ extension 2 ...
//!                                ▼
//!                           Composition { document, dependencies, diagnostics }
//! ```
//!
//! Unparseable documents and malformed paths abort the run. Everything else
//! that goes wrong inside an extension is logged, recorded as a
//! [`Diagnostic`], and skipped.

use crate::adapter::{attribute, child_elements, view_root};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::directives::{Directive, DirectiveContext, DirectiveError};
use crate::error::ComposeError;
use crate::guards::{DenyAll, GuardContext};
use crate::path::{PathCache, PathResolver, ViewIdentity};
use crate::position::Position;
use crate::view::ViewRecord;
use crate::zones::ZoneLocator;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use viewcompose_parser::{parse, serialize_pretty, Document, NodeId, Serializer};

static DENY_ALL: DenyAll = DenyAll;

/// One extension document plus the label used in logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionView {
    pub label: String,
    pub xml: String,
}

impl ExtensionView {
    pub fn new(label: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            xml: xml.into(),
        }
    }
}

impl From<&ViewRecord> for ExtensionView {
    fn from(view: &ViewRecord) -> Self {
        Self::new(view.label(), view.xml.clone())
    }
}

/// Result of a composition run
#[derive(Debug, Clone)]
pub struct Composition {
    pub document: Document,
    pub view_root: NodeId,
    pub dependent_modules: BTreeSet<String>,
    pub dependent_features: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Composition {
    /// The whole document, indented
    pub fn to_xml(&self) -> String {
        serialize_pretty(&self.document)
    }

    /// Only the view element, indented
    pub fn view_xml(&self) -> String {
        Serializer::pretty().serialize_node(&self.document, self.view_root)
    }
}

/// Builder for one composition run
pub struct Composer<'g> {
    view: ViewIdentity,
    base_xml: String,
    extensions: Vec<ExtensionView>,
    guards: &'g dyn GuardContext,
    cache: Option<Arc<PathCache>>,
}

impl<'g> Composer<'g> {
    pub fn new(view: ViewIdentity, base_xml: impl Into<String>) -> Self {
        Self {
            view,
            base_xml: base_xml.into(),
            extensions: Vec::new(),
            guards: &DENY_ALL,
            cache: None,
        }
    }

    pub fn for_view(base: &ViewRecord) -> Self {
        Self::new(base.identity(), base.xml.clone())
    }

    pub fn extension(mut self, extension: impl Into<ExtensionView>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    pub fn extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExtensionView>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Guard predicates; without them every `if-feature`/`if-module` block is skipped
    pub fn guards(mut self, guards: &'g dyn GuardContext) -> Self {
        self.guards = guards;
        self
    }

    /// Path cache to use instead of [`PathCache::global`]
    pub fn cache(mut self, cache: Arc<PathCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parse the base view and apply every extension in order
    #[instrument(skip(self), fields(view = %self.view, extensions = self.extensions.len()))]
    pub fn compute(&self) -> Result<Composition, ComposeError> {
        let base_label = self.view.to_string();
        let doc = parse(&self.base_xml).map_err(|source| ComposeError::Parse {
            document: base_label.clone(),
            source,
        })?;
        let root = view_root(&doc).map_err(|_| ComposeError::ViewNotFound {
            document: base_label,
        })?;

        let cache = self.cache.clone().unwrap_or_else(PathCache::global);
        let mut run = CompositionRun {
            view: &self.view,
            doc,
            view_root: root,
            resolver: PathResolver::new(self.view.clone(), cache),
            guards: self.guards,
            dependent_modules: BTreeSet::new(),
            dependent_features: BTreeSet::new(),
            diagnostics: Vec::new(),
        };

        for extension in &self.extensions {
            run.apply_extension(extension)?;
        }

        let composition = run.finish();
        info!(
            modules = composition.dependent_modules.len(),
            features = composition.dependent_features.len(),
            skipped = composition.diagnostics.len(),
            "Composed view"
        );
        Ok(composition)
    }
}

/// Working state of one `compute` call
struct CompositionRun<'c> {
    view: &'c ViewIdentity,
    doc: Document,
    view_root: NodeId,
    resolver: PathResolver,
    guards: &'c dyn GuardContext,
    dependent_modules: BTreeSet<String>,
    dependent_features: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> CompositionRun<'c> {
    fn apply_extension(&mut self, extension: &ExtensionView) -> Result<(), ComposeError> {
        debug!(extension = %extension.label, "Applying extension");

        let source = parse(&extension.xml).map_err(|source| ComposeError::Parse {
            document: extension.label.clone(),
            source,
        })?;
        let source_root = view_root(&source).map_err(|_| ComposeError::ViewNotFound {
            document: extension.label.clone(),
        })?;

        for node in child_elements(&source, source_root) {
            if source.tag(node) == Some("extend") {
                self.apply_extend(extension, &source, node)?;
            } else {
                self.append(extension, &source, node)?;
            }
        }
        Ok(())
    }

    fn apply_extend(&mut self, extension: &ExtensionView, source: &Document, block: NodeId) -> Result<(), ComposeError> {
        if !self.guards_allow(source, block) {
            return Ok(());
        }

        let Some(target_path) = source.attribute(block, "target") else {
            let error = DirectiveError::MissingAttribute {
                directive: "extend",
                attribute: "target",
            };
            self.skip(extension, "", DiagnosticKind::MissingAttribute, error.to_string());
            return Ok(());
        };

        let target = self
            .resolver
            .resolve(target_path, &self.doc)
            .map_err(|source| ComposeError::Path {
                document: extension.label.clone(),
                source,
            })?;
        let Some(target) = target else {
            self.skip(
                extension,
                target_path,
                DiagnosticKind::TargetNotFound,
                format!("extend target not found: {}", target_path),
            );
            return Ok(());
        };

        for item in child_elements(source, block) {
            let result = Directive::from_element(source, item).and_then(|directive| {
                debug!(directive = directive.name(), path = target_path, "Applying directive");
                DirectiveContext::new(&mut self.doc, &mut self.view_root, &self.resolver)
                    .apply(source, &directive, target)
            });

            match result {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    self.skip(extension, target_path, (&err).into(), err.to_string())
                }
                Err(err) => return Err(ComposeError::directive(extension.label.clone(), err)),
            }
        }
        Ok(())
    }

    /// Records guard names and reports whether the block may run
    fn guards_allow(&mut self, source: &Document, block: NodeId) -> bool {
        let feature = attribute(source, block, "if-feature").trim();
        if !feature.is_empty() {
            self.dependent_features.insert(feature.to_string());
            if !self.guards.feature_enabled(feature) {
                debug!(feature, "Feature disabled, skipping extend block");
                return false;
            }
        }

        let module = attribute(source, block, "if-module").trim();
        if !module.is_empty() {
            self.dependent_modules.insert(module.to_string());
            if !self.guards.module_installed(module) {
                debug!(module, "Module not installed, skipping extend block");
                return false;
            }
        }

        true
    }

    /// Plain extension content goes at the end of the view, ahead of panel-mail
    fn append(&mut self, extension: &ExtensionView, source: &Document, node: NodeId) -> Result<(), ComposeError> {
        let mail = ZoneLocator::new(&self.resolver)
            .trailing_anchor(&self.doc)
            .map_err(|source| ComposeError::Path {
                document: extension.label.clone(),
                source,
            })?;

        let imported = self.doc.import_node(source, node);
        let result = match mail {
            Some(mail) => Position::Before.insert(&mut self.doc, mail, imported),
            None => self.doc.append_child(self.view_root, imported),
        };

        if let Err(err) = result {
            self.skip(extension, "", DiagnosticKind::InvalidTree, err.to_string());
        }
        Ok(())
    }

    fn skip(&mut self, extension: &ExtensionView, target: &str, kind: DiagnosticKind, message: String) {
        match kind {
            DiagnosticKind::TargetNotFound | DiagnosticKind::UnknownDirective => error!(
                view = %self.view,
                extension = %extension.label,
                path = target,
                "{}",
                message
            ),
            _ => warn!(
                view = %self.view,
                extension = %extension.label,
                path = target,
                "{}",
                message
            ),
        }
        self.diagnostics
            .push(Diagnostic::new(extension.label.clone(), target, kind, message));
    }

    fn finish(self) -> Composition {
        Composition {
            document: self.doc,
            view_root: self.view_root,
            dependent_modules: self.dependent_modules,
            dependent_features: self.dependent_features,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::StaticGuards;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"<object-views><form name="user-form"><panel name="main"/></form></object-views>"#;

    fn composer<'g>() -> Composer<'g> {
        Composer::new(ViewIdentity::new("user-form", "form"), BASE)
            .cache(Arc::new(PathCache::with_capacity(64)))
    }

    fn wrap(body: &str) -> String {
        format!(r#"<object-views><form name="user-form" extension="true">{}</form></object-views>"#, body)
    }

    #[test]
    fn test_no_extensions_returns_base() {
        let composition = composer().compute().unwrap();
        assert_eq!(
            Serializer::new().serialize(&composition.document),
            BASE
        );
        assert!(composition.diagnostics.is_empty());
    }

    #[test]
    fn test_append_goes_before_panel_mail() {
        let composition = composer()
            .extension(ExtensionView::new("mail", wrap("<panel-mail/>")))
            .extension(ExtensionView::new("extra", wrap(r#"<panel name="extra"/>"#)))
            .compute()
            .unwrap();
        assert_eq!(
            Serializer::new().serialize_node(&composition.document, composition.view_root),
            r#"<form name="user-form"><panel name="main"/><panel name="extra"/><panel-mail/></form>"#
        );
    }

    #[test]
    fn test_guards_record_dependencies() {
        let guards = StaticGuards::default().with_module("sale");
        let composition = composer()
            .guards(&guards)
            .extension(ExtensionView::new(
                "guarded",
                wrap(
                    r#"<extend target="panel" if-feature="beta"><attribute name="a" value="1"/></extend>
                       <extend target="panel" if-module="sale"><attribute name="b" value="1"/></extend>
                       <extend target="panel" if-module="crm"><attribute name="c" value="1"/></extend>"#,
                ),
            ))
            .compute()
            .unwrap();

        assert_eq!(
            composition.view_xml(),
            "<form name=\"user-form\">\n  <panel name=\"main\" b=\"1\"/>\n</form>"
        );
        assert_eq!(
            composition.dependent_features.into_iter().collect::<Vec<_>>(),
            vec!["beta"]
        );
        assert_eq!(
            composition.dependent_modules.into_iter().collect::<Vec<_>>(),
            vec!["crm", "sale"]
        );
    }

    #[test]
    fn test_unknown_directive_is_skipped() {
        let composition = composer()
            .extension(ExtensionView::new(
                "odd",
                wrap(r#"<extend target="panel"><explode/><attribute name="ok" value="yes"/></extend>"#),
            ))
            .compute()
            .unwrap();
        assert_eq!(composition.diagnostics.len(), 1);
        assert_eq!(composition.diagnostics[0].kind, DiagnosticKind::UnknownDirective);
        assert_eq!(composition.diagnostics[0].extension, "odd");
        let main = composition.document.element_children(composition.view_root)[0];
        assert_eq!(composition.document.attribute(main, "ok"), Some("yes"));
    }

    #[test]
    fn test_missing_target_attribute() {
        let composition = composer()
            .extension(ExtensionView::new("no-target", wrap("<extend><replace/></extend>")))
            .compute()
            .unwrap();
        assert_eq!(composition.diagnostics[0].kind, DiagnosticKind::MissingAttribute);
        assert_eq!(composition.document.element_children(composition.view_root).len(), 1);
    }

    #[test]
    fn test_base_parse_error() {
        let err = Composer::new(ViewIdentity::new("user-form", "form"), "<object-views><form>")
            .compute()
            .unwrap_err();
        assert!(matches!(err, ComposeError::Parse { .. }));
        assert_eq!(err.document(), "user-form(form)");
    }

    #[test]
    fn test_extension_without_view_is_fatal() {
        let err = composer()
            .extension(ExtensionView::new("empty", "<object-views/>"))
            .compute()
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::ViewNotFound {
                document: "empty".into()
            }
        );
    }

    #[test]
    fn test_malformed_target_is_fatal() {
        let err = composer()
            .extension(ExtensionView::new("bad", wrap(r#"<extend target="panel[@name="/>"#)))
            .compute()
            .unwrap_err();
        assert!(matches!(err, ComposeError::Path { .. }));
    }

    #[test]
    fn test_wrapper_targets_are_skipped() {
        let composition = composer()
            .extension(ExtensionView::new(
                "escape",
                wrap(
                    r#"<extend target=".."><insert position="after"><form name="g"/></insert></extend>
                       <extend target=".."><move source="" position="before"/></extend>
                       <extend target=".."><replace><x/></replace></extend>
                       <extend target="panel"><move source=".." position="inside"/></extend>"#,
                ),
            ))
            .compute()
            .unwrap();

        let kinds: Vec<_> = composition.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::OutsideView; 4]);
        assert_eq!(composition.document.element_children(composition.document.root()).len(), 1);
        assert_eq!(Serializer::new().serialize(&composition.document), BASE);
    }

    #[test]
    fn test_malformed_move_source_is_fatal() {
        let err = composer()
            .extension(ExtensionView::new(
                "bad-move",
                wrap(r#"<extend target="panel"><move source="a["/></extend>"#),
            ))
            .compute()
            .unwrap_err();
        assert!(matches!(err, ComposeError::Path { .. }));
        assert_eq!(err.document(), "bad-move");
    }

    #[test]
    fn test_extension_from_view_record() {
        let record = ViewRecord::new("user-form", "form", wrap(""))
            .with_xml_id("sale-user-form")
            .as_extension();
        let extension = ExtensionView::from(&record);
        assert_eq!(extension.label, "user-form(id=sale-user-form)");
    }
}
