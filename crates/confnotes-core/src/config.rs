use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub behavior: BehaviorConfig,
    pub repository: RepositoryConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Apply every response in arrival order.
    #[default]
    Apply,
    /// Drop update and fetch responses overtaken by a newer request.
    DropSuperseded,
}

impl StaleResponsePolicy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::DropSuperseded => "drop-superseded",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BehaviorConfig {
    pub surface_mutation_errors: bool,
    pub stale_responses: StaleResponsePolicy,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            surface_mutation_errors: false,
            stale_responses: StaleResponsePolicy::Apply,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    #[default]
    Memory,
    JsonFile,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RepositoryConfig {
    pub kind: RepositoryKind,
    pub path: Option<PathBuf>,
    pub latency_ms: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            kind: RepositoryKind::Memory,
            path: None,
            latency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiTheme {
    #[default]
    Classic,
    HighContrast,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::HighContrast => "high-contrast",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::HighContrast,
            Self::HighContrast => Self::Classic,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UiConfig {
    pub theme: UiTheme,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
