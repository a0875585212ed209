//! Validation of literal stack inputs.
//!
//! These checks only cover what can be known before talking to the cloud:
//! naming rules, cron shape, instance bounds. Quotas, permissions and name
//! collisions are reported by the provisioning engine at plan/apply time.

use crate::config::components::functions::ResolvedFunction;
use crate::config::components::global::StackConfig;
use crate::config::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

static PROJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:[a-z0-9-]{0,28}[a-z0-9])?$").unwrap());
static REGION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+-[a-z]+[0-9]+$").unwrap());
static ACCOUNT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][-a-z0-9]{4,28}[a-z0-9]$").unwrap());
static FUNCTION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?$").unwrap());
static SECRET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,255}$").unwrap());
static SECRET_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:latest|[1-9][0-9]*)$").unwrap());
static ENV_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap());
static TOPIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9\-_.~+%]{2,254}$").unwrap());
static BUCKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{1,61}[a-z0-9]$").unwrap());
static BQ_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,1024}$").unwrap());
static CRON_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z*/,?-]+$").unwrap());
static STACK_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());

pub fn validate_stack(config: &StackConfig) -> Result<(), ConfigError> {
    check(&STACK_NAME, "name", &config.name)?;
    check(&PROJECT_ID, "project", &config.project)?;
    check(&REGION, "region", &config.region)?;
    check(&BUCKET, "bucket", &config.bucket_name)?;
    check(&BUCKET, "state.bucket", &config.state.bucket)?;
    non_empty("provider_version", &config.provider_version)?;

    if config.asset_retention_days == 0 {
        return Err(ConfigError::invalid(
            "asset_retention_days",
            "must be at least 1 day",
        ));
    }

    if let Some(repo) = &config.repository {
        non_empty("repository.owner", &repo.owner)?;
        non_empty("repository.name", &repo.name)?;
        non_empty("repository.build_file", &repo.build_file)?;
        regex::Regex::new(&repo.branch).map_err(|e| {
            ConfigError::invalid("repository.branch", format!("not a valid regex: {e}"))
        })?;
    }

    validate_cities(&config.cities)?;

    check(&SECRET_ID, "secret.id", &config.secret.id)?;
    check(&SECRET_VERSION, "secret.version", &config.secret.version)?;
    check(&ENV_KEY, "secret.env_key", &config.secret.env_key)?;
    non_empty("secret.placeholder", &config.secret.placeholder)?;

    check(
        &TOPIC,
        "messaging.transformer_queue",
        &config.messaging.transformer_queue,
    )?;

    validate_function("functions.weather_getter", &config.weather_getter)?;
    validate_function("functions.transformer", &config.transformer)?;
    if config.weather_getter.name == config.transformer.name {
        return Err(ConfigError::invalid(
            "functions",
            format!("both functions are named '{}'", config.transformer.name),
        ));
    }

    check(&ACCOUNT_ID, "schedule.name", &scheduler_account_id(&config.schedule.name))?;
    non_empty("schedule.time_zone", &config.schedule.time_zone)?;
    validate_cron(&config.schedule.cron)?;

    check(&BQ_ID, "warehouse.dataset", &config.warehouse.dataset)?;
    check(&BQ_ID, "warehouse.table", &config.warehouse.table)?;
    check(&TOPIC, "warehouse.bridge_topic", &config.warehouse.bridge_topic)?;
    if config.warehouse.bridge_topic == config.messaging.transformer_queue {
        return Err(ConfigError::invalid(
            "warehouse.bridge_topic",
            "must differ from messaging.transformer_queue",
        ));
    }

    Ok(())
}

/// Service account id used by the scheduler job.
pub fn scheduler_account_id(schedule_name: &str) -> String {
    format!("{schedule_name}-invoker")
}

fn validate_cities(cities: &[String]) -> Result<(), ConfigError> {
    if cities.is_empty() {
        return Err(ConfigError::invalid("cities", "at least one city is required"));
    }
    for (i, city) in cities.iter().enumerate() {
        let field = format!("cities[{i}]");
        if city.is_empty() {
            return Err(ConfigError::invalid(field, "city name is empty"));
        }
        // The function splits CITIES on ','
        if city.contains(',') {
            return Err(ConfigError::invalid(
                field,
                format!("'{city}' must not contain ','"),
            ));
        }
    }
    Ok(())
}

fn validate_function(prefix: &str, function: &ResolvedFunction) -> Result<(), ConfigError> {
    check(&FUNCTION_NAME, &format!("{prefix}.name"), &function.name)?;
    check(
        &ACCOUNT_ID,
        &format!("{prefix}.name"),
        &function.runner_account_id(),
    )?;
    non_empty(&format!("{prefix}.entry_point"), &function.entry_point)?;
    non_empty(&format!("{prefix}.runtime"), &function.runtime)?;
    non_empty(&format!("{prefix}.memory"), &function.memory)?;
    if function.max_instances == 0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.max_instances"),
            "must be at least 1",
        ));
    }
    if function.min_instances > function.max_instances {
        return Err(ConfigError::invalid(
            format!("{prefix}.min_instances"),
            format!(
                "min_instances ({}) exceeds max_instances ({})",
                function.min_instances, function.max_instances
            ),
        ));
    }
    if !function.source_dir.is_dir() {
        return Err(ConfigError::invalid(
            format!("{prefix}.source_dir"),
            format!("'{}' is not a directory", function.source_dir.display()),
        ));
    }
    Ok(())
}

fn validate_cron(cron: &str) -> Result<(), ConfigError> {
    let fields = cron.split_whitespace().collect::<Vec<_>>();
    if fields.len() != 5 {
        return Err(ConfigError::invalid(
            "schedule.cron",
            format!("expected 5 fields, found {} in '{cron}'", fields.len()),
        ));
    }
    if let Some(bad) = fields.iter().find(|f| !CRON_FIELD.is_match(f)) {
        return Err(ConfigError::invalid(
            "schedule.cron",
            format!("unexpected field '{bad}' in '{cron}'"),
        ));
    }
    Ok(())
}

fn check(re: &Regex, field: &str, value: &str) -> Result<(), ConfigError> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("'{value}' does not match {}", re.as_str()),
        ))
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::invalid(field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_requires_five_fields() {
        assert!(validate_cron("* * * * *").is_ok());
        assert!(validate_cron("*/5 0-6 * JAN MON-FRI").is_ok());
        let err = validate_cron("* * * *").unwrap_err();
        assert_eq!(err.field(), Some("schedule.cron"));
        assert!(validate_cron("* * * * $").is_err());
    }

    #[test]
    fn cities_reject_empty_and_commas() {
        assert!(validate_cities(&["Tokyo".to_string()]).is_ok());
        assert!(validate_cities(&[]).is_err());
        let err = validate_cities(&["Tokyo,Osaka".to_string()]).unwrap_err();
        assert_eq!(err.field(), Some("cities[0]"));
    }

    #[test]
    fn naming_rules() {
        assert!(PROJECT_ID.is_match("cautious-guacamole-381604"));
        assert!(PROJECT_ID.is_match("p"));
        assert!(!PROJECT_ID.is_match("P"));
        assert!(!PROJECT_ID.is_match("trailing-"));
        assert!(ACCOUNT_ID.is_match("weather-getter-runner"));
        assert!(!ACCOUNT_ID.is_match("a-very-long-function-name-runner-x"));
        assert!(SECRET_VERSION.is_match("2"));
        assert!(SECRET_VERSION.is_match("latest"));
        assert!(!SECRET_VERSION.is_match("0"));
        assert!(TOPIC.is_match("transformer-queue"));
        assert!(BQ_ID.is_match("weather_dataset"));
        assert!(!BQ_ID.is_match("weather-dataset"));
    }
}
