use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Attach an OIDC identity token to the HTTP call.
    #[serde(default = "default_oidc")]
    pub oidc: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            cron: default_cron(),
            time_zone: default_time_zone(),
            oidc: default_oidc(),
        }
    }
}

fn default_name() -> String {
    "scheduler".to_string()
}

fn default_cron() -> String {
    "* * * * *".to_string()
}

fn default_time_zone() -> String {
    "Etc/UTC".to_string()
}

fn default_oidc() -> bool {
    true
}
