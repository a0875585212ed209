pub mod address;
pub mod build;
pub mod errors;
pub mod functions;
pub mod iam;
pub mod project;
pub mod provider;
pub mod pubsub;
pub mod scheduler;
pub mod secrets;
pub mod storage;
pub mod traits;
pub mod warehouse;

pub use address::{literal, Address, BlockKind, Reference};
pub use errors::ResourceError;
pub use traits::Declare;
