use crate::traits::Declare;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OidcToken {
    pub service_account_email: String,
    pub audience: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget {
    pub uri: String,
    pub http_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_token: Option<OidcToken>,
}

impl HttpTarget {
    pub fn post(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            http_method: "POST".to_string(),
            oidc_token: None,
        }
    }

    /// Sign requests with an identity token for `service_account_email`,
    /// scoped to the target URI.
    pub fn with_oidc(mut self, service_account_email: impl Into<String>) -> Self {
        self.oidc_token = Some(OidcToken {
            service_account_email: service_account_email.into(),
            audience: self.uri.clone(),
        });
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CloudSchedulerJob {
    pub name: String,
    pub region: String,
    pub schedule: String,
    pub time_zone: String,
    pub attempt_deadline: String,
    pub http_target: HttpTarget,
}

impl Declare for CloudSchedulerJob {
    fn kind(&self) -> &'static str {
        "google_cloud_scheduler_job"
    }
}
