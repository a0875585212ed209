use clap::Args;
use common::error::StackError;
use std::fs;
use std::path::{Path, PathBuf};

use super::synth::DEFAULT_OUT_DIR;

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[arg(long = "out", short = 'o', default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,
}

/// Remove the synth output directory. A missing directory is not an error.
pub fn handle_clean(out: &Path) -> Result<(), StackError> {
    if !out.exists() {
        log::info!("nothing to clean at {}", out.display());
        return Ok(());
    }
    fs::remove_dir_all(out).map_err(|e| StackError::synth(e))?;
    log::info!("removed {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_removes_out_dir_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stack.out");
        fs::create_dir_all(out.join("assets/transformer")).unwrap();
        fs::write(out.join("main.tf.json"), "{}").unwrap();

        handle_clean(&out).unwrap();
        assert!(!out.exists());
        handle_clean(&out).unwrap();
    }
}
