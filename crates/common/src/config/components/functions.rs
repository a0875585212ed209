use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_RUNTIME: &str = "go121";
pub const DEFAULT_MEMORY: &str = "256M";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionsConfig {
    pub weather_getter: FunctionConfig,
    pub transformer: FunctionConfig,
}

/// Per-function deployment settings as written in `stack.yml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub source_dir: PathBuf,
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default)]
    pub min_instances: u32,
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    #[serde(default = "default_memory")]
    pub memory: String,
}

/// Fully resolved function settings: defaults applied and `source_dir`
/// anchored at the config root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFunction {
    pub name: String,
    pub source_dir: PathBuf,
    pub entry_point: String,
    pub runtime: String,
    pub min_instances: u32,
    pub max_instances: u32,
    pub memory: String,
}

impl ResolvedFunction {
    pub fn resolve(
        config: &FunctionConfig,
        default_name: &str,
        default_entry_point: &str,
        source_dir: PathBuf,
    ) -> Self {
        Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| default_name.to_string()),
            source_dir,
            entry_point: config
                .entry_point
                .clone()
                .unwrap_or_else(|| default_entry_point.to_string()),
            runtime: config.runtime.clone(),
            min_instances: config.min_instances,
            max_instances: config.max_instances,
            memory: config.memory.clone(),
        }
    }

    /// Service account id that runs this function.
    pub fn runner_account_id(&self) -> String {
        format!("{}-runner", self.name)
    }
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_max_instances() -> u32 {
    1
}

fn default_memory() -> String {
    DEFAULT_MEMORY.to_string()
}
