use crate::config::components::global::StackConfig;
use crate::config::components::stack_project::StackProjectConfig;
use crate::config::error::ConfigError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const STACK_FILE_NAME: &str = "stack.yml";

/// Locate `stack.yml` in `config_dir` (or the working directory), parse it
/// and resolve it into a validated [`StackConfig`].
pub fn read_config(config_dir: Option<PathBuf>) -> Result<StackConfig, ConfigError> {
    let stack_file_path = if let Some(config_path) = config_dir {
        config_path.join(STACK_FILE_NAME)
    } else {
        STACK_FILE_NAME.into()
    };

    if !stack_file_path.exists() {
        return Err(ConfigError::incorrect_path(&stack_file_path));
    }

    debug!("loading stack config from {}", stack_file_path.display());
    let stack_file = fs::File::open(&stack_file_path)?;
    let project: StackProjectConfig = serde_yaml::from_reader(stack_file)?;

    let config_root = stack_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    StackConfig::from_project(project, &config_root)
}

/// Parse a stack definition from a YAML string, resolving relative paths
/// against `root`.
pub fn parse_config(yaml: &str, root: &Path) -> Result<StackConfig, ConfigError> {
    let project: StackProjectConfig = serde_yaml::from_str(yaml)?;
    StackConfig::from_project(project, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::components::warehouse::SinkMode;
    use test_utils::{with_chdir, write_fixture_project, FIXTURE_STACK_YML};

    #[test]
    fn test_read_config_from_fixture_project() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture_project(dir.path(), FIXTURE_STACK_YML).unwrap();

        let config = read_config(Some(root.clone())).expect("should load fixture config");

        assert_eq!(config.project, "cautious-guacamole-381604");
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.bucket_name, "asset-bucket-cautious-guacamole-381604");
        assert_eq!(config.state.bucket, "cautious-guacamole-381604-tfstate");
        assert_eq!(config.state.prefix, "weather-stack");
        assert_eq!(config.cities, vec!["Tokyo".to_string()]);
        assert_eq!(config.weather_getter.name, "weather-getter");
        assert_eq!(config.weather_getter.entry_point, "GetWeather");
        assert_eq!(config.transformer.entry_point, "Transform");
        assert_eq!(config.weather_getter.source_dir, root.join("weathergetter"));
        assert_eq!(config.warehouse.sink, SinkMode::TopicBridge);
        assert_eq!(config.warehouse_location(), "us-central1");
        assert_eq!(config.schedule.cron, "* * * * *");
        assert!(config.schedule.oidc);
    }

    #[test]
    fn read_config_defaults_to_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture_project(dir.path(), FIXTURE_STACK_YML).unwrap();

        let config = with_chdir(&root, || read_config(None))
            .expect("chdir")
            .expect("config in working directory");
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(
            config.transformer.source_dir,
            PathBuf::from(".").join("transformer")
        );
    }

    #[test]
    fn missing_stack_file_is_incorrect_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::IncorrectPath { .. }));
    }

    #[test]
    fn invalid_instance_bounds_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = FIXTURE_STACK_YML.replace(
            "entry_point: Transform",
            "entry_point: Transform\n    min_instances: 3\n    max_instances: 1",
        );
        let root = write_fixture_project(dir.path(), &yaml).unwrap();

        let err = read_config(Some(root)).unwrap_err();
        assert_eq!(err.field(), Some("functions.transformer.min_instances"));
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = FIXTURE_STACK_YML.replace("region: us-central1\n", "");
        let root = write_fixture_project(dir.path(), &yaml).unwrap();

        let err = read_config(Some(root)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn direct_insert_sink_parses() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture_project(dir.path(), FIXTURE_STACK_YML).unwrap();
        let yaml = FIXTURE_STACK_YML.replace("sink: topic_bridge", "sink: direct_insert");

        let config = parse_config(&yaml, &root).unwrap();
        assert_eq!(config.warehouse.sink, SinkMode::DirectInsert);
    }
}
