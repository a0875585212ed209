use crate::config::components::functions::FunctionsConfig;
use crate::config::components::schedule::ScheduleConfig;
use crate::config::components::warehouse::WarehouseConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROVIDER_VERSION: &str = "~> 5.0";
pub const DEFAULT_TRANSFORMER_QUEUE: &str = "transformer-queue";
pub const DEFAULT_SECRET_ID: &str = "open-weather-secret";
pub const DEFAULT_SECRET_ENV: &str = "OPEN_WEATHER_API_KEY";
pub const DEFAULT_ASSET_RETENTION_DAYS: u32 = 1;

// ---------------- Stack Project Config (stack.yml) ----------------
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StackProjectConfig {
    pub name: String,
    pub project: String,
    pub region: String,
    #[serde(default)]
    pub repository: Option<RepositoryConfig>,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default = "default_provider_version")]
    pub provider_version: String,
    /// Overrides the derived `asset-bucket-<project>` name.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_retention")]
    pub asset_retention_days: u32,
    pub cities: Vec<String>,
    pub secret: SecretConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    pub functions: FunctionsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

/// Source repository watched by the CI build trigger.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_build_file")]
    pub build_file: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default = "default_secret_id")]
    pub id: String,
    /// Version number referenced by functions, or `latest`.
    pub version: String,
    /// Initial payload; the real key is added as a new version out of band.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_secret_env")]
    pub env_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MessagingConfig {
    #[serde(default = "default_transformer_queue")]
    pub transformer_queue: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            transformer_queue: default_transformer_queue(),
        }
    }
}

fn default_provider_version() -> String {
    DEFAULT_PROVIDER_VERSION.to_string()
}

fn default_retention() -> u32 {
    DEFAULT_ASSET_RETENTION_DAYS
}

fn default_branch() -> String {
    ".*".to_string()
}

fn default_build_file() -> String {
    "cloudbuild.yaml".to_string()
}

fn default_secret_id() -> String {
    DEFAULT_SECRET_ID.to_string()
}

fn default_placeholder() -> String {
    "dummy".to_string()
}

fn default_secret_env() -> String {
    DEFAULT_SECRET_ENV.to_string()
}

fn default_transformer_queue() -> String {
    DEFAULT_TRANSFORMER_QUEUE.to_string()
}
