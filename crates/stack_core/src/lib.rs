pub mod asset;
pub mod builder;
pub mod stack;
pub mod synth;

pub use asset::{AssetError, FunctionAsset};
pub use builder::{build_stack, StackBuilder};
pub use stack::Stack;
pub use synth::{synth, SynthReport};
