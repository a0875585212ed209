use crate::stack::Stack;
use common::error::StackError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAIN_FILE: &str = "main.tf.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const GRAPH_FILE: &str = "graph.dot";

/// One declared node as recorded in `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestNode {
    pub address: String,
    pub path: String,
    /// Direct upstream addresses.
    pub depends_on: Vec<String>,
}

/// Root manifest structure serialised to JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub stack: String,
    /// Asset id to content hash.
    pub assets: BTreeMap<String, String>,
    /// Nodes in declaration order.
    pub nodes: Vec<ManifestNode>,
}

impl Manifest {
    pub fn from_stack(stack: &Stack) -> Self {
        Self {
            stack: stack.name.clone(),
            assets: stack
                .assets
                .iter()
                .map(|a| (a.id.clone(), a.hash.clone()))
                .collect(),
            nodes: stack
                .graph
                .declaration_order()
                .into_iter()
                .map(|node| ManifestNode {
                    address: node.address.to_string(),
                    path: node.path(),
                    depends_on: node.relations.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }

    /// Read a manifest left by an earlier synth. Unreadable manifests are
    /// treated as absent.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("ignoring unreadable manifest {}: {e}", path.display());
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetChange {
    Added,
    Unchanged,
    Changed,
}

impl Display for AssetChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetChange::Added => write!(f, "added"),
            AssetChange::Unchanged => write!(f, "unchanged"),
            AssetChange::Changed => write!(f, "changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthReport {
    pub out_dir: PathBuf,
    /// Archives written during this run; existing ones are reused.
    pub archives_written: Vec<PathBuf>,
    pub asset_changes: BTreeMap<String, AssetChange>,
}

/// Write the engine configuration, manifest, DOT graph and function
/// archives for `stack` into `out_dir`.
pub fn synth(stack: &Stack, out_dir: &Path) -> Result<SynthReport, StackError> {
    fs::create_dir_all(out_dir).map_err(|e| StackError::synth(e))?;

    let manifest_path = out_dir.join(MANIFEST_FILE);
    let previous = Manifest::load(&manifest_path);

    let mut archives_written = Vec::new();
    let mut asset_changes = BTreeMap::new();
    for asset in &stack.assets {
        if asset.package(out_dir).map_err(|e| StackError::synth(e))? {
            archives_written.push(asset.archive_path(out_dir));
        }

        let change = match previous.as_ref().and_then(|m| m.assets.get(&asset.id)) {
            None => AssetChange::Added,
            Some(hash) if *hash == asset.hash => AssetChange::Unchanged,
            Some(_) => AssetChange::Changed,
        };
        info!("asset {}: {change} ({})", asset.id, asset.object_name());
        asset_changes.insert(asset.id.clone(), change);
    }

    let document = stack.to_terraform_json()?;
    write_json(&out_dir.join(MAIN_FILE), &document)?;
    write_json(&manifest_path, &Manifest::from_stack(stack))?;
    stack
        .graph
        .export_dot_to(out_dir.join(GRAPH_FILE))
        .map_err(|e| StackError::synth(e))?;

    info!(
        "synthesized {} nodes into {}",
        stack.graph.len(),
        out_dir.display()
    );
    Ok(SynthReport {
        out_dir: out_dir.to_path_buf(),
        archives_written,
        asset_changes,
    })
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), StackError> {
    let file = fs::File::create(path).map_err(|e| StackError::synth(e))?;
    serde_json::to_writer_pretty(file, value).map_err(|e| StackError::synth(e))
}
