use crate::address::BlockKind;
use crate::traits::Declare;
use serde::Serialize;

/// Read-only lookup of the provider's project, used for its `number`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectData {
    pub project_id: String,
}

impl Declare for ProjectData {
    fn kind(&self) -> &'static str {
        "google_project"
    }

    fn block(&self) -> BlockKind {
        BlockKind::Data
    }
}
