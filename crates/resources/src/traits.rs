use crate::address::BlockKind;
use crate::errors::ResourceError;
use serde::Serialize;
use serde_json::Value;

/// A descriptor that can be placed in the deployment graph.
///
/// The serialised form is the body of the engine block, with attribute names
/// exactly as the provider expects them.
pub trait Declare: Serialize {
    /// Engine type, e.g. `google_storage_bucket`.
    fn kind(&self) -> &'static str;

    fn block(&self) -> BlockKind {
        BlockKind::Resource
    }

    fn to_body(&self) -> Result<Value, ResourceError> {
        serde_json::to_value(self).map_err(|e| ResourceError::serde_json(self.kind(), e))
    }
}
