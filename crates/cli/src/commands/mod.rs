pub mod clean;
pub mod graph;
pub mod init;
pub mod synth;
pub mod validate;

pub use clean::handle_clean;
pub use graph::handle_graph;
pub use init::handle_init;
pub use synth::handle_synth;
pub use validate::handle_validate;
