use crate::traits::Declare;
use serde::Serialize;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleActionType {
    Delete,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LifecycleAction {
    #[serde(rename = "type")]
    pub action_type: LifecycleActionType,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LifecycleCondition {
    /// Object age in days.
    pub age: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRule {
    pub action: LifecycleAction,
    pub condition: LifecycleCondition,
}

impl LifecycleRule {
    pub fn delete_after_days(days: u32) -> Self {
        Self {
            action: LifecycleAction {
                action_type: LifecycleActionType::Delete,
            },
            condition: LifecycleCondition { age: days },
        }
    }

    /// Whether an object of the given age satisfies the age condition. An
    /// object becomes eligible once it is at least `age` days old.
    pub fn is_eligible(&self, object_age: Duration) -> bool {
        object_age.as_secs() >= u64::from(self.condition.age) * SECONDS_PER_DAY
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageBucket {
    pub name: String,
    pub location: String,
    /// Deleting the bucket also deletes every object in it.
    pub force_destroy: bool,
    pub uniform_bucket_level_access: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lifecycle_rule: Vec<LifecycleRule>,
}

impl StorageBucket {
    /// Artifact bucket whose objects are purged after `retention_days`.
    pub fn for_artifacts(
        name: impl Into<String>,
        location: impl Into<String>,
        retention_days: u32,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            force_destroy: true,
            uniform_bucket_level_access: true,
            lifecycle_rule: vec![LifecycleRule::delete_after_days(retention_days)],
        }
    }
}

impl Declare for StorageBucket {
    fn kind(&self) -> &'static str {
        "google_storage_bucket"
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageBucketObject {
    /// Object name; content-addressed (`<hash>.zip`).
    pub name: String,
    pub bucket: String,
    /// Local path of the file uploaded by the engine.
    pub source: String,
}

impl Declare for StorageBucketObject {
    fn kind(&self) -> &'static str {
        "google_storage_bucket_object"
    }
}
