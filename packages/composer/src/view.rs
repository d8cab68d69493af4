use crate::path::ViewIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_PRIORITY: i32 = 20;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// One stored view: a base view or a module's extension of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Domain model the view edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Group codes the view is restricted to; empty means everyone
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups: BTreeSet<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub extension: bool,
    /// Full markup, wrapper root included
    pub xml: String,
}

impl ViewRecord {
    pub fn new(name: impl Into<String>, view_type: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            view_type: view_type.into(),
            xml_id: None,
            module: None,
            model: None,
            groups: BTreeSet::new(),
            priority: DEFAULT_PRIORITY,
            extension: false,
            xml: xml.into(),
        }
    }

    pub fn with_xml_id(mut self, xml_id: impl Into<String>) -> Self {
        self.xml_id = Some(xml_id.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Group codes from a comma separated list
    pub fn with_groups(mut self, codes: &str) -> Self {
        self.groups = codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn as_extension(mut self) -> Self {
        self.extension = true;
        self
    }

    pub fn identity(&self) -> ViewIdentity {
        ViewIdentity::new(self.name.clone(), self.view_type.clone())
    }

    /// `name(id=xml_id)`, used in logs and errors
    pub fn label(&self) -> String {
        format!("{}(id={})", self.name, self.xml_id.as_deref().unwrap_or("-"))
    }
}
