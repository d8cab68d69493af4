//! Predicates behind `if-feature` and `if-module`

use std::collections::HashSet;

/// Answers guard questions for a composition run
pub trait GuardContext: Send + Sync {
    fn feature_enabled(&self, name: &str) -> bool;
    fn module_installed(&self, name: &str) -> bool;
}

/// Every guard fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl GuardContext for DenyAll {
    fn feature_enabled(&self, _name: &str) -> bool {
        false
    }

    fn module_installed(&self, _name: &str) -> bool {
        false
    }
}

/// Fixed sets of enabled features and installed modules
#[derive(Debug, Clone, Default)]
pub struct StaticGuards {
    features: HashSet<String>,
    modules: HashSet<String>,
}

impl StaticGuards {
    pub fn new<F, M>(features: F, modules: M) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>) -> Self {
        self.features.insert(name.into());
        self
    }

    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.modules.insert(name.into());
        self
    }
}

impl GuardContext for StaticGuards {
    fn feature_enabled(&self, name: &str) -> bool {
        self.features.contains(name)
    }

    fn module_installed(&self, name: &str) -> bool {
        self.modules.contains(name)
    }
}

/// Guards backed by two closures
pub struct FnGuards<F, M> {
    feature: F,
    module: M,
}

impl<F, M> FnGuards<F, M>
where
    F: Fn(&str) -> bool + Send + Sync,
    M: Fn(&str) -> bool + Send + Sync,
{
    pub fn new(feature: F, module: M) -> Self {
        Self { feature, module }
    }
}

impl<F, M> GuardContext for FnGuards<F, M>
where
    F: Fn(&str) -> bool + Send + Sync,
    M: Fn(&str) -> bool + Send + Sync,
{
    fn feature_enabled(&self, name: &str) -> bool {
        (self.feature)(name)
    }

    fn module_installed(&self, name: &str) -> bool {
        (self.module)(name)
    }
}
