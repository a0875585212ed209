use crate::address::BlockKind;
use crate::traits::Declare;
use serde::Serialize;

pub const GOOGLE_PROVIDER_SOURCE: &str = "hashicorp/google";

/// Project and region scope applied to every descriptor in the stack.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GoogleProvider {
    pub project: String,
    pub region: String,
}

impl Declare for GoogleProvider {
    fn kind(&self) -> &'static str {
        "google"
    }

    fn block(&self) -> BlockKind {
        BlockKind::Provider
    }
}

/// `terraform.required_providers.google`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RequiredProvider {
    pub source: String,
    pub version: String,
}

impl RequiredProvider {
    pub fn google(version: impl Into<String>) -> Self {
        Self {
            source: GOOGLE_PROVIDER_SOURCE.to_string(),
            version: version.into(),
        }
    }
}

/// Remote state location (`terraform.backend.gcs`).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GcsBackend {
    pub bucket: String,
    pub prefix: String,
}
