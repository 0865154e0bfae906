use crate::error::{ClassloomError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Policy for plugin discovery failures (missing directory, missing entry
/// class). Everything past discovery degrades locally regardless of mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    #[default]
    Abort,
    Log,
    Silent,
}

impl FromStr for ErrorMode {
    type Err = ClassloomError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "abort" | "exception" => Ok(ErrorMode::Abort),
            "log" => Ok(ErrorMode::Log),
            "silent" => Ok(ErrorMode::Silent),
            other => Err(ClassloomError::Config(format!(
                "unknown error mode: {other}"
            ))),
        }
    }
}

/// Weave-pass configuration.
///
/// Defaults mirror a conventional application layout: plugins under
/// `app/Plugins`, synthesized units and the class map cache under
/// `storage/plugins`. Every field can be overridden from the environment
/// (`CLASSLOOM_*`) or loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveConfig {
    pub plugin_directory: PathBuf,
    pub plugin_namespace: String,
    pub plugin_class_suffix: String,
    pub storage_directory: PathBuf,
    pub cache_enabled: bool,
    pub error_mode: ErrorMode,
    pub auto_create_directory: bool,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            plugin_directory: PathBuf::from("app/Plugins"),
            plugin_namespace: "App\\Plugins".to_string(),
            plugin_class_suffix: "Plugin".to_string(),
            storage_directory: PathBuf::from("storage/plugins"),
            cache_enabled: true,
            error_mode: ErrorMode::Abort,
            auto_create_directory: true,
        }
    }
}

impl WeaveConfig {
    /// Default configuration resolved against an application root.
    pub fn for_root(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            plugin_directory: root.join(&defaults.plugin_directory),
            storage_directory: root.join(&defaults.storage_directory),
            ..defaults
        }
    }

    /// Root-relative defaults with environment overrides applied.
    pub fn from_env(root: &Path) -> Result<Self> {
        let mut config = Self::for_root(root);
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("CLASSLOOM_PLUGIN_DIRECTORY") {
            self.plugin_directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLASSLOOM_PLUGIN_NAMESPACE") {
            self.plugin_namespace = v;
        }
        if let Ok(v) = std::env::var("CLASSLOOM_CLASS_SUFFIX") {
            self.plugin_class_suffix = v;
        }
        if let Ok(v) = std::env::var("CLASSLOOM_STORAGE_DIRECTORY") {
            self.storage_directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLASSLOOM_CACHE") {
            self.cache_enabled = parse_bool(&v)?;
        }
        if let Ok(v) = std::env::var("CLASSLOOM_ERROR_MODE") {
            self.error_mode = v.parse()?;
        }
        if let Ok(v) = std::env::var("CLASSLOOM_AUTO_CREATE_DIRECTORY") {
            self.auto_create_directory = parse_bool(&v)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Location of the serialized class map cache.
    pub fn cache_file(&self) -> PathBuf {
        self.storage_directory.join("classmap.json")
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(ClassloomError::Config(format!(
            "invalid boolean value: {other}"
        ))),
    }
}
