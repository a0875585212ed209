use crate::traits::Declare;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PubsubTopic {
    pub name: String,
}

impl Declare for PubsubTopic {
    fn kind(&self) -> &'static str {
        "google_pubsub_topic"
    }
}

/// Managed bridge that writes each message straight into a BigQuery table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BigqueryConfig {
    /// `project.dataset.table`
    pub table: String,
    /// Map the JSON message onto the table's columns.
    pub use_table_schema: bool,
    pub write_metadata: bool,
    pub drop_unknown_fields: bool,
}

impl BigqueryConfig {
    pub fn into_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            use_table_schema: true,
            write_metadata: false,
            drop_unknown_fields: true,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PubsubSubscription {
    pub name: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bigquery_config: Option<BigqueryConfig>,
}

impl Declare for PubsubSubscription {
    fn kind(&self) -> &'static str {
        "google_pubsub_subscription"
    }
}
