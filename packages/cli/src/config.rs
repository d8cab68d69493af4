use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use viewcompose_composer::path::DEFAULT_CAPACITY;
use viewcompose_composer::StaticGuards;

pub const DEFAULT_CONFIG_NAME: &str = "viewcompose.config.json";

/// ViewCompose configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Modules in dependency order
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,

    /// Enabled feature names
    #[serde(default)]
    pub features: Vec<String>,

    /// Installed modules; every configured module when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_modules: Option<Vec<String>>,

    /// Output directory for computed views
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Worker threads; available parallelism when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    #[serde(default = "default_path_cache_capacity")]
    pub path_cache_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    /// View directory, relative to the project
    pub dir: String,
}

fn default_out_dir() -> String {
    "dist".to_string()
}

fn default_path_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Module names in dependency order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn get_out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1))
    }

    /// Guard answers for `if-feature` and `if-module`
    pub fn guards(&self) -> StaticGuards {
        let installed = match &self.installed_modules {
            Some(modules) => modules.clone(),
            None => self.modules.iter().map(|m| m.name.clone()).collect(),
        };
        StaticGuards::new(self.features.iter().cloned(), installed)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules: vec![],
            features: vec![],
            installed_modules: None,
            out_dir: default_out_dir(),
            workers: None,
            path_cache_capacity: default_path_cache_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewcompose_composer::GuardContext;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "modules": [
                { "name": "base", "dir": "modules/base" },
                { "name": "sale", "dir": "modules/sale" }
            ],
            "features": ["beta"],
            "outDir": "build",
            "workers": 2
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.module_names(), vec!["base", "sale"]);
        assert_eq!(config.modules[1].dir, "modules/sale");
        assert_eq!(config.out_dir, "build");
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.path_cache_capacity, DEFAULT_CAPACITY);

        let guards = config.guards();
        assert!(guards.feature_enabled("beta"));
        assert!(guards.module_installed("sale"));
        assert!(!guards.module_installed("crm"));
    }

    #[test]
    fn test_installed_modules_override() {
        let json = r#"{
            "modules": [{ "name": "base", "dir": "base" }],
            "installedModules": ["crm"]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let guards = config.guards();
        assert!(guards.module_installed("crm"));
        assert!(!guards.module_installed("base"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.modules.is_empty());
        assert_eq!(config.out_dir, "dist");
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }
}
