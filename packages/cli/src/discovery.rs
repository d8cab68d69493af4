//! Finds view definitions in module directories
//!
//! Each `*.xml` file holds one wrapper element with any number of view
//! elements inside. Every view becomes its own [`ViewRecord`], re-wrapped
//! in a copy of the wrapper so it can be composed on its own.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use viewcompose_composer::view::DEFAULT_PRIORITY;
use viewcompose_composer::ViewRecord;
use viewcompose_parser::{format_error, parse, Document, NodeId, Serializer};
use walkdir::WalkDir;

/// Every view of every configured module, in module order
pub fn discover(cwd: &Path, config: &Config) -> Result<Vec<ViewRecord>> {
    let mut views = Vec::new();

    for module in &config.modules {
        let dir = cwd.join(&module.dir);
        if !dir.exists() {
            return Err(anyhow!(
                "View directory of module '{}' does not exist: {}",
                module.name,
                dir.display()
            ));
        }

        for file in find_xml_files(&dir) {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let found = views_in_file(&source, &file, &module.name)?;
            debug!(module = %module.name, file = %file.display(), views = found.len(), "Discovered views");
            views.extend(found);
        }
    }

    Ok(views)
}

fn find_xml_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("xml"))
        .collect()
}

/// Split one file into view records owned by `module`
pub fn views_in_file(source: &str, file: &Path, module: &str) -> Result<Vec<ViewRecord>> {
    let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
    let doc = parse(source).map_err(|e| anyhow!("\n{}", format_error(source, file_name, &e)))?;

    let Some(wrapper) = doc.document_element() else {
        return Ok(Vec::new());
    };

    let mut views = Vec::new();
    for view in doc.element_children(wrapper) {
        let Some(name) = doc.attribute(view, "name") else {
            warn!(file = %file.display(), "Skipping view without a name");
            continue;
        };
        let view_type = doc.tag(view).unwrap_or_default();

        let priority = match doc.attribute(view, "priority") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid priority '{}' on view {} in {}", value, name, file.display()))?,
            None => DEFAULT_PRIORITY,
        };

        let mut record = ViewRecord::new(name, view_type, rewrap(&doc, wrapper, view)?)
            .with_module(module)
            .with_priority(priority);
        if let Some(id) = doc.attribute(view, "id") {
            record = record.with_xml_id(id);
        }
        if let Some(model) = doc.attribute(view, "model") {
            record = record.with_model(model);
        }
        if let Some(groups) = doc.attribute(view, "groups") {
            record = record.with_groups(groups);
        }
        if doc.attribute(view, "extension") == Some("true") {
            record = record.as_extension();
        }
        views.push(record);
    }
    Ok(views)
}

/// Copy of the wrapper holding only `view`
fn rewrap(doc: &Document, wrapper: NodeId, view: NodeId) -> Result<String> {
    let mut single = Document::new();
    let tag = doc.tag(wrapper).unwrap_or("object-views");
    let root = single.create_element(tag);
    single.append_child(single.root(), root)?;
    for attr in doc.attributes(wrapper) {
        single.set_attribute(root, &attr.name, &attr.value)?;
    }
    let copy = single.import_node(doc, view);
    single.append_child(root, copy)?;
    Ok(Serializer::new().serialize(&single))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use pretty_assertions::assert_eq;

    const FILE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<object-views xmlns="http://example.com/views">
  <form name="user-form" id="sale-user-form" extension="true" priority="30">
    <extend target="panel"><attribute name="x" value="1"/></extend>
  </form>
  <grid name="user-grid">
    <field name="code"/>
  </grid>
</object-views>"#;

    #[test]
    fn test_views_in_file() {
        let views = views_in_file(FILE, Path::new("views/User.xml"), "sale").unwrap();
        assert_eq!(views.len(), 2);

        let form = &views[0];
        assert_eq!(form.name, "user-form");
        assert_eq!(form.view_type, "form");
        assert_eq!(form.xml_id.as_deref(), Some("sale-user-form"));
        assert_eq!(form.module.as_deref(), Some("sale"));
        assert_eq!(form.priority, 30);
        assert!(form.extension);

        let grid = &views[1];
        assert!(!grid.extension);
        assert_eq!(grid.priority, DEFAULT_PRIORITY);
        assert_eq!(
            grid.xml,
            r#"<object-views xmlns="http://example.com/views"><grid name="user-grid"><field name="code"/></grid></object-views>"#
        );
    }

    #[test]
    fn test_views_in_file_reads_model_and_groups() {
        let source = r#"<object-views>
  <form name="user-form" model="com.example.User" groups="admins, staff"/>
  <form name="user-form" extension="true"/>
</object-views>"#;
        let views = views_in_file(source, Path::new("User.xml"), "base").unwrap();

        assert_eq!(views[0].model.as_deref(), Some("com.example.User"));
        let groups: Vec<_> = views[0].groups.iter().map(String::as_str).collect();
        assert_eq!(groups, vec!["admins", "staff"]);

        assert_eq!(views[1].model, None);
        assert!(views[1].groups.is_empty());
    }

    #[test]
    fn test_invalid_file_reports_location() {
        let err = views_in_file("<object-views><form>", Path::new("Bad.xml"), "sale").unwrap_err();
        assert!(err.to_string().contains("Bad.xml"));
    }

    #[test]
    fn test_discover_walks_modules_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base/views");
        let sale = dir.path().join("sale");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&sale).unwrap();
        fs::write(
            base.join("User.xml"),
            r#"<object-views><form name="user-form"><panel/></form></object-views>"#,
        )
        .unwrap();
        fs::write(
            sale.join("User.xml"),
            r#"<object-views><form name="user-form" extension="true"/></object-views>"#,
        )
        .unwrap();
        fs::write(sale.join("notes.txt"), "not a view").unwrap();

        let config = Config {
            modules: vec![
                ModuleConfig {
                    name: "base".into(),
                    dir: "base".into(),
                },
                ModuleConfig {
                    name: "sale".into(),
                    dir: "sale".into(),
                },
            ],
            ..Config::default()
        };

        let views = discover(dir.path(), &config).unwrap();
        let summary: Vec<_> = views
            .iter()
            .map(|v| (v.module.as_deref().unwrap_or_default(), v.extension))
            .collect();
        assert_eq!(summary, vec![("base", false), ("sale", true)]);
    }

    #[test]
    fn test_missing_module_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            modules: vec![ModuleConfig {
                name: "ghost".into(),
                dir: "nowhere".into(),
            }],
            ..Config::default()
        };
        assert!(discover(dir.path(), &config).is_err());
    }
}
