use common::error::DiagnosticMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("serde json error: {context}")]
    SerdeJson {
        context: DiagnosticMessage,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid descriptor: {context}")]
    Invalid { context: DiagnosticMessage },
}

impl ResourceError {
    #[track_caller]
    pub fn serde_json(kind: impl Into<String>, source: serde_json::Error) -> Self {
        Self::SerdeJson {
            context: DiagnosticMessage::for_subject(kind, "failed to serialise descriptor"),
            source,
        }
    }

    #[track_caller]
    pub fn invalid(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            context: DiagnosticMessage::for_subject(kind, message.into()),
        }
    }
}
