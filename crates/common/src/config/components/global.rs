use crate::config::components::functions::ResolvedFunction;
use crate::config::components::schedule::ScheduleConfig;
use crate::config::components::stack_project::{
    MessagingConfig, RepositoryConfig, SecretConfig, StackProjectConfig,
};
use crate::config::components::warehouse::WarehouseConfig;
use crate::config::error::ConfigError;
use crate::config::validate;
use std::path::{Path, PathBuf};

pub const DEFAULT_WEATHER_GETTER_NAME: &str = "weather-getter";
pub const DEFAULT_WEATHER_GETTER_ENTRY_POINT: &str = "GetWeather";
pub const DEFAULT_TRANSFORMER_NAME: &str = "transformer";
pub const DEFAULT_TRANSFORMER_ENTRY_POINT: &str = "Transform";

/// Where the provisioning engine keeps its state file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBackendConfig {
    pub bucket: String,
    pub prefix: String,
}

// ---------------- global config ----------------
/// Validated, fully defaulted stack configuration handed to the graph
/// builder. Nothing in here is read from process-wide state.
#[derive(Debug, Clone)]
pub struct StackConfig {
    pub name: String,
    pub project: String,
    pub region: String,
    pub provider_version: String,
    pub repository: Option<RepositoryConfig>,
    pub state: StateBackendConfig,
    pub bucket_name: String,
    pub asset_retention_days: u32,
    pub cities: Vec<String>,
    pub secret: SecretConfig,
    pub messaging: MessagingConfig,
    pub weather_getter: ResolvedFunction,
    pub transformer: ResolvedFunction,
    pub schedule: ScheduleConfig,
    pub warehouse: WarehouseConfig,
    /// Directory containing `stack.yml`.
    pub root: PathBuf,
}

impl StackConfig {
    /// Apply defaults, anchor relative paths at `root` and validate every
    /// literal value.
    pub fn from_project(project: StackProjectConfig, root: &Path) -> Result<Self, ConfigError> {
        let weather_getter = ResolvedFunction::resolve(
            &project.functions.weather_getter,
            DEFAULT_WEATHER_GETTER_NAME,
            DEFAULT_WEATHER_GETTER_ENTRY_POINT,
            resolve_path(root, &project.functions.weather_getter.source_dir),
        );
        let transformer = ResolvedFunction::resolve(
            &project.functions.transformer,
            DEFAULT_TRANSFORMER_NAME,
            DEFAULT_TRANSFORMER_ENTRY_POINT,
            resolve_path(root, &project.functions.transformer.source_dir),
        );

        let state = StateBackendConfig {
            bucket: project
                .state
                .bucket
                .clone()
                .unwrap_or_else(|| format!("{}-tfstate", project.project)),
            prefix: project
                .state
                .prefix
                .clone()
                .unwrap_or_else(|| project.name.clone()),
        };

        let bucket_name = project
            .bucket
            .clone()
            .unwrap_or_else(|| format!("asset-bucket-{}", project.project));

        let mut warehouse = project.warehouse.clone();
        if warehouse.location.is_none() {
            warehouse.location = Some(project.region.clone());
        }

        let config = Self {
            name: project.name,
            project: project.project,
            region: project.region,
            provider_version: project.provider_version,
            repository: project.repository,
            state,
            bucket_name,
            asset_retention_days: project.asset_retention_days,
            cities: project
                .cities
                .into_iter()
                .map(|c| c.trim().to_string())
                .collect(),
            secret: project.secret,
            messaging: project.messaging,
            weather_getter,
            transformer,
            schedule: project.schedule,
            warehouse,
            root: root.to_path_buf(),
        };

        validate::validate_stack(&config)?;
        Ok(config)
    }

    pub fn functions(&self) -> [&ResolvedFunction; 2] {
        [&self.weather_getter, &self.transformer]
    }

    /// Location used for the dataset; always populated after resolution.
    pub fn warehouse_location(&self) -> &str {
        self.warehouse.location.as_deref().unwrap_or(&self.region)
    }
}

pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
