use crate::traits::Declare;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomaticReplication {}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Replication {
    pub auto: AutomaticReplication,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretManagerSecret {
    pub secret_id: String,
    pub replication: Replication,
}

impl SecretManagerSecret {
    pub fn replicated(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            replication: Replication::default(),
        }
    }
}

impl Declare for SecretManagerSecret {
    fn kind(&self) -> &'static str {
        "google_secret_manager_secret"
    }
}

/// An opaque payload version of a secret.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretManagerSecretVersion {
    /// `${google_secret_manager_secret.<name>.id}`
    pub secret: String,
    pub secret_data: String,
}

impl Declare for SecretManagerSecretVersion {
    fn kind(&self) -> &'static str {
        "google_secret_manager_secret_version"
    }
}
