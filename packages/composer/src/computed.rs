//! Computed view records
//!
//! A computed view stores the composed markup next to the base view it was
//! derived from, with a higher priority so it is picked first.

use crate::composer::{Composer, Composition};
use crate::error::ComposeError;
use crate::guards::GuardContext;
use crate::path::PathCache;
use crate::view::ViewRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const COMPUTED_SUFFIX: &str = "__computed__";

const DELIMITER: &str = ",";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedView {
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
    pub xml_id: String,
    pub computed: bool,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Comma separated
    #[serde(default)]
    pub dependent_modules: String,
    /// Comma separated
    #[serde(default)]
    pub dependent_features: String,
    /// The composed view element
    pub xml: String,
}

impl ComputedView {
    /// Build the record for a finished composition
    ///
    /// Returns `None` when there were no extensions: such a view has no
    /// computed counterpart.
    pub fn build(base: &ViewRecord, extensions: &[ViewRecord], composition: &Composition) -> Option<Self> {
        if extensions.is_empty() {
            return None;
        }

        let xml_id = format!(
            "{}{}",
            base.xml_id.as_deref().unwrap_or(&base.name),
            COMPUTED_SUFFIX
        );
        let groups = composition
            .document
            .attribute(composition.view_root, "groups")
            .map(split_groups)
            .unwrap_or_default();

        Some(Self {
            name: base.name.clone(),
            view_type: base.view_type.clone(),
            xml_id,
            computed: true,
            priority: base.priority + 1,
            module: last_module(extensions),
            groups,
            dependent_modules: join(&composition.dependent_modules),
            dependent_features: join(&composition.dependent_features),
            xml: composition.view_xml(),
        })
    }

    /// Compose `base` with `extensions` (already ordered) and build the record
    pub fn generate(
        base: &ViewRecord,
        extensions: &[ViewRecord],
        guards: &dyn GuardContext,
        cache: Arc<PathCache>,
    ) -> Result<Option<(Self, Composition)>, ComposeError> {
        if extensions.is_empty() {
            return Ok(None);
        }

        let composition = Composer::for_view(base)
            .extensions(extensions)
            .guards(guards)
            .cache(cache)
            .compute()?;

        Ok(Self::build(base, extensions, &composition).map(|view| (view, composition)))
    }
}

fn last_module(extensions: &[ViewRecord]) -> Option<String> {
    extensions
        .iter()
        .rev()
        .filter_map(|v| v.module.as_deref())
        .find(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn split_groups(codes: &str) -> Vec<String> {
    codes
        .split(DELIMITER)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn join<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::StaticGuards;

    fn base() -> ViewRecord {
        ViewRecord::new(
            "user-form",
            "form",
            r#"<object-views><form name="user-form" groups="admins, users ,"><panel name="main"/></form></object-views>"#,
        )
        .with_xml_id("base-user-form")
        .with_module("base")
    }

    fn extension(id: &str, module: &str, body: &str) -> ViewRecord {
        ViewRecord::new(
            "user-form",
            "form",
            format!(r#"<object-views><form name="user-form" extension="true">{}</form></object-views>"#, body),
        )
        .with_xml_id(id)
        .with_module(module)
        .as_extension()
    }

    #[test]
    fn test_generate_record() {
        let extensions = vec![
            extension(
                "sale-user-form",
                "sale",
                r#"<extend target="panel" if-feature="beta" if-module="stock"><attribute name="x" value="1"/></extend>"#,
            ),
            extension("crm-user-form", "crm", r#"<extend target="panel" if-module="base"/>"#),
        ];
        let guards = StaticGuards::new(["beta"], ["stock", "base"]);
        let (view, _) = ComputedView::generate(
            &base(),
            &extensions,
            &guards,
            Arc::new(PathCache::with_capacity(16)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(view.xml_id, "base-user-form__computed__");
        assert!(view.computed);
        assert_eq!(view.priority, 21);
        assert_eq!(view.module.as_deref(), Some("crm"));
        assert_eq!(view.groups, vec!["admins", "users"]);
        assert_eq!(view.dependent_modules, "base,stock");
        assert_eq!(view.dependent_features, "beta");
        assert_eq!(
            view.xml,
            "<form name=\"user-form\" groups=\"admins, users ,\">\n  <panel name=\"main\" x=\"1\"/>\n</form>"
        );
    }

    #[test]
    fn test_no_extensions_no_record() {
        let guards = StaticGuards::default();
        let result = ComputedView::generate(
            &base(),
            &[],
            &guards,
            Arc::new(PathCache::with_capacity(16)),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_xml_id_falls_back_to_name() {
        let mut base = base();
        base.xml_id = None;
        let ext = extension("e", " ", "");
        let composition = Composer::for_view(&base)
            .extension(&ext)
            .cache(Arc::new(PathCache::with_capacity(4)))
            .compute()
            .unwrap();
        let view = ComputedView::build(&base, &[ext], &composition).unwrap();
        assert_eq!(view.xml_id, "user-form__computed__");
        assert_eq!(view.module, None);
    }

    #[test]
    fn test_json_shape() {
        let view = ComputedView {
            name: "n".into(),
            view_type: "grid".into(),
            xml_id: "n__computed__".into(),
            computed: true,
            priority: 21,
            module: None,
            groups: vec![],
            dependent_modules: String::new(),
            dependent_features: String::new(),
            xml: "<grid/>".into(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "grid");
        assert_eq!(json["xmlId"], "n__computed__");
        assert!(json.get("module").is_none());
    }
}
