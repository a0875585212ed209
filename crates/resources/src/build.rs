use crate::traits::Declare;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PushFilter {
    /// Regex of branch names that trigger a build.
    pub branch: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GithubEventsConfig {
    pub owner: String,
    pub name: String,
    pub push: PushFilter,
}

/// CI trigger that runs the repository's build file on every matching push.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CloudbuildTrigger {
    pub filename: String,
    pub github: GithubEventsConfig,
}

impl Declare for CloudbuildTrigger {
    fn kind(&self) -> &'static str {
        "google_cloudbuild_trigger"
    }
}
