use crate::address::Reference;
use crate::traits::Declare;
use serde::Serialize;

pub const ROLE_SECRET_ACCESSOR: &str = "roles/secretmanager.secretAccessor";
pub const ROLE_PUBSUB_PUBLISHER: &str = "roles/pubsub.publisher";
pub const ROLE_BIGQUERY_DATA_EDITOR: &str = "roles/bigquery.dataEditor";
pub const ROLE_RUN_INVOKER: &str = "roles/run.invoker";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub account_id: String,
    pub display_name: String,
}

impl Declare for ServiceAccount {
    fn kind(&self) -> &'static str {
        "google_service_account"
    }
}

/// `serviceAccount:<email>` member string for a declared service account.
pub fn service_account_member(email: &Reference) -> String {
    email.prefixed("serviceAccount:")
}

/// Member string of the Pub/Sub service agent, derived from the project
/// number (`data.google_project.<name>.number`).
pub fn pubsub_service_agent_member(project_number: &Reference) -> String {
    format!("serviceAccount:service-{project_number}@gcp-sa-pubsub.iam.gserviceaccount.com")
}

/// What a grant applies to. Each scope maps to a distinct engine type so a
/// role is granted on the narrowest object that needs it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum IamScope {
    Secret {
        project: String,
        secret_id: String,
    },
    Topic {
        project: String,
        topic: String,
    },
    Dataset {
        project: String,
        dataset_id: String,
    },
    CloudRunService {
        project: String,
        location: String,
        service: String,
    },
}

/// Additive grant of `role` to `member` on `scope`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IamMember {
    pub role: String,
    pub member: String,
    #[serde(flatten)]
    pub scope: IamScope,
}

impl IamMember {
    pub fn new(role: &str, member: impl Into<String>, scope: IamScope) -> Self {
        Self {
            role: role.to_string(),
            member: member.into(),
            scope,
        }
    }
}

impl Declare for IamMember {
    fn kind(&self) -> &'static str {
        match self.scope {
            IamScope::Secret { .. } => "google_secret_manager_secret_iam_member",
            IamScope::Topic { .. } => "google_pubsub_topic_iam_member",
            IamScope::Dataset { .. } => "google_bigquery_dataset_iam_member",
            IamScope::CloudRunService { .. } => "google_cloud_run_service_iam_member",
        }
    }
}
