use common::error::DiagnosticMessage;
use resources::{Address, ResourceError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    #[error("found duplicated declaration of node: {context}")]
    DuplicateNode { context: DiagnosticMessage },
    #[error("expected dependency not found: {context}")]
    MissingExpectedDependency { context: DiagnosticMessage },
    #[error("provider binding: {context}")]
    ProviderNotBound { context: DiagnosticMessage },
    #[error("invalid node id: {context}")]
    InvalidId { context: DiagnosticMessage },
    #[error("found cyclic references in graph for: {}", .0.join(", "))]
    CycleDetected(Vec<String>),
    #[error("node not found: {context}")]
    NotFound { context: DiagnosticMessage },
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("I/O error caused by: {0}")]
    Io(#[from] io::Error),
}

impl DagError {
    #[track_caller]
    pub fn duplicate(address: &Address) -> Self {
        Self::DuplicateNode {
            context: DiagnosticMessage::for_subject(address.to_string(), "already declared"),
        }
    }

    #[track_caller]
    pub fn missing_dependency(address: &Address, missing: &Address) -> Self {
        Self::MissingExpectedDependency {
            context: DiagnosticMessage::for_subject(
                address.to_string(),
                format!("references `{missing}` which has not been declared"),
            ),
        }
    }

    #[track_caller]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderNotBound {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn invalid_id(id: &str) -> Self {
        Self::InvalidId {
            context: DiagnosticMessage::for_subject(
                id.to_string(),
                "ids must start with a letter or underscore and contain only letters, digits, `_` or `-`",
            ),
        }
    }

    #[track_caller]
    pub fn not_found(address: &Address) -> Self {
        Self::NotFound {
            context: DiagnosticMessage::for_subject(address.to_string(), "not in graph"),
        }
    }
}
