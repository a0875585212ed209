use crate::traits::Declare;
use serde::Serialize;
use std::collections::BTreeMap;

pub const PUBSUB_MESSAGE_PUBLISHED: &str = "google.cloud.pubsub.topic.v1.messagePublished";
pub const RETRY_POLICY_DO_NOT_RETRY: &str = "RETRY_POLICY_DO_NOT_RETRY";

/// Attribute path of the generated HTTPS endpoint.
pub const URI_ATTRIBUTE: &str = "service_config[0].uri";
/// Attribute path of the underlying Cloud Run service name.
pub const SERVICE_ATTRIBUTE: &str = "name";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageSource {
    pub bucket: String,
    pub object: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FunctionSource {
    pub storage_source: StorageSource,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub runtime: String,
    pub entry_point: String,
    pub source: FunctionSource,
}

/// Environment variable whose value is read from Secret Manager.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretEnvironmentVariable {
    pub key: String,
    pub project_id: String,
    pub secret: String,
    pub version: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub min_instance_count: u32,
    pub max_instance_count: u32,
    pub available_memory: String,
    pub timeout_seconds: u32,
    pub environment_variables: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_environment_variables: Vec<SecretEnvironmentVariable>,
    pub service_account_email: String,
    pub ingress_settings: String,
    pub all_traffic_on_latest_revision: bool,
}

impl ServiceConfig {
    /// Scale-to-zero service running as `service_account_email`.
    pub fn scale_to_zero(
        max_instance_count: u32,
        available_memory: impl Into<String>,
        service_account_email: impl Into<String>,
    ) -> Self {
        Self {
            min_instance_count: 0,
            max_instance_count,
            available_memory: available_memory.into(),
            timeout_seconds: 60,
            environment_variables: BTreeMap::new(),
            secret_environment_variables: Vec::new(),
            service_account_email: service_account_email.into(),
            ingress_settings: "ALLOW_ALL".to_string(),
            all_traffic_on_latest_revision: true,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }
}

/// Invoke the function for every message published to `pubsub_topic`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EventTrigger {
    pub trigger_region: String,
    pub event_type: String,
    /// Fully qualified topic id (`${google_pubsub_topic.<name>.id}`).
    pub pubsub_topic: String,
    pub retry_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_email: Option<String>,
}

impl EventTrigger {
    pub fn on_topic(trigger_region: impl Into<String>, pubsub_topic: impl Into<String>) -> Self {
        Self {
            trigger_region: trigger_region.into(),
            event_type: PUBSUB_MESSAGE_PUBLISHED.to_string(),
            pubsub_topic: pubsub_topic.into(),
            retry_policy: RETRY_POLICY_DO_NOT_RETRY.to_string(),
            service_account_email: None,
        }
    }
}

/// Second generation serverless function.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CloudFunction {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub build_config: BuildConfig,
    pub service_config: ServiceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<EventTrigger>,
}

impl CloudFunction {
    pub fn env(&self, key: &str) -> Option<&str> {
        self.service_config
            .environment_variables
            .get(key)
            .map(String::as_str)
    }
}

impl Declare for CloudFunction {
    fn kind(&self) -> &'static str {
        "google_cloudfunctions2_function"
    }
}
