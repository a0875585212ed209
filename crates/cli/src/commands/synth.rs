use clap::Args;
use common::config::loader::read_config;
use common::error::StackError;
use stack_core::synth::SynthReport;
use stack_core::{build_stack, synth};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUT_DIR: &str = "stack.out";

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Directory receiving main.tf.json, manifest.json, graph.dot and archives
    #[arg(long = "out", short = 'o', default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,
}

/// Build the stack described by `stack.yml` and write it to `out`.
pub fn handle_synth(out: &Path, config_path: Option<PathBuf>) -> Result<SynthReport, StackError> {
    let config = read_config(config_path)?;
    let stack = build_stack(&config)?;
    let report = synth(&stack, out)?;
    for (asset, change) in &report.asset_changes {
        log::info!("{asset}: {change}");
    }
    Ok(report)
}
