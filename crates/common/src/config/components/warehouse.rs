use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How rows reach the warehouse table.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkMode {
    /// The transformer publishes to a bridge topic and a BigQuery
    /// subscription streams that topic into the table.
    #[default]
    TopicBridge,
    /// The transformer inserts rows into the table itself.
    DirectInsert,
}

impl Display for SinkMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkMode::TopicBridge => write!(f, "topic_bridge"),
            SinkMode::DirectInsert => write!(f, "direct_insert"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WarehouseConfig {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_table")]
    pub table: String,
    /// Dataset location; falls back to the stack region.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sink: SinkMode,
    #[serde(default = "default_bridge_topic")]
    pub bridge_topic: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            table: default_table(),
            location: None,
            sink: SinkMode::default(),
            bridge_topic: default_bridge_topic(),
        }
    }
}

fn default_dataset() -> String {
    "weather_dataset".to_string()
}

fn default_table() -> String {
    "weather_table".to_string()
}

fn default_bridge_topic() -> String {
    "big-query-queue".to_string()
}
