use common::config::loader::read_config;
use common::error::StackError;
use stack_core::build_stack;
use std::path::PathBuf;

/// Print the resource dependency graph in DOT format.
pub fn handle_graph(config_path: Option<PathBuf>) -> Result<(), StackError> {
    let config = read_config(config_path)?;
    let stack = build_stack(&config)?;
    print!("{}", stack.graph.to_dot_string());
    Ok(())
}
