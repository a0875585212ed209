use common::config::loader::read_config;
use common::error::StackError;
use log::info;
use stack_core::build_stack;
use std::path::PathBuf;

/// Build the graph without writing anything and report the declaration
/// order. Returns the number of declared nodes.
pub fn handle_validate(config_path: Option<PathBuf>) -> Result<usize, StackError> {
    let config = read_config(config_path)?;
    let stack = build_stack(&config)?;
    for (i, node) in stack.graph.declaration_order().iter().enumerate() {
        info!("{:>3}. {}", i + 1, node.address);
    }
    info!("stack {} is valid", stack.name);
    Ok(stack.graph.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::ConfigError;
    use test_utils::{write_fixture_project, FIXTURE_STACK_YML};

    #[test]
    fn validate_counts_declared_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture_project(dir.path(), FIXTURE_STACK_YML).unwrap();
        // provider, trigger, bucket, 2 objects, 2 topics, secret + version,
        // dataset + table, 3 accounts, 3 grants, 2 functions, invoker grant,
        // scheduler, project data, agent grant, subscription
        assert_eq!(handle_validate(Some(root)).unwrap(), 24);
    }

    #[test]
    fn validate_reports_bad_literals() {
        let dir = tempfile::tempdir().unwrap();
        let yml = FIXTURE_STACK_YML.replace("cron: \"* * * * *\"", "cron: \"* * *\"");
        let root = write_fixture_project(dir.path(), &yml).unwrap();
        let err = handle_validate(Some(root)).expect_err("cron has three fields");
        match err {
            StackError::Init { source, .. } => {
                let source = source.expect("config error source");
                let config_err = source
                    .downcast_ref::<ConfigError>()
                    .expect("source is a ConfigError");
                assert_eq!(config_err.field(), Some("schedule.cron"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
