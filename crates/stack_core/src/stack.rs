use crate::asset::FunctionAsset;
use common::error::StackError;
use dag::types::ResourceNode;
use dag::ResourceGraph;
use resources::provider::{GcsBackend, RequiredProvider};
use resources::{Address, BlockKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub value: String,
    pub description: String,
}

/// A fully linked deployment graph plus everything needed to render it.
#[derive(Debug)]
pub struct Stack {
    pub name: String,
    pub required_provider: RequiredProvider,
    pub backend: GcsBackend,
    pub graph: ResourceGraph,
    pub assets: Vec<FunctionAsset>,
    pub outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn node(&self, address: &Address) -> Option<&ResourceNode> {
        self.graph.get(address)
    }

    pub fn asset(&self, id: &str) -> Option<&FunctionAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Render the engine configuration document (`main.tf.json`).
    pub fn to_terraform_json(&self) -> Result<Value, StackError> {
        let mut providers: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        let mut data: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        let mut resources: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();

        for node in self.graph.declaration_order() {
            let address = &node.address;
            let body = node.rendered_body();
            match address.block {
                BlockKind::Provider => providers.entry(address.kind.clone()).or_default().push(body),
                BlockKind::Data => {
                    data.entry(address.kind.clone())
                        .or_default()
                        .insert(address.name.clone(), body);
                }
                BlockKind::Resource => {
                    resources
                        .entry(address.kind.clone())
                        .or_default()
                        .insert(address.name.clone(), body);
                }
            }
        }

        let mut required_providers = Map::new();
        required_providers.insert("google".to_string(), to_value(&self.required_provider)?);
        let mut backend = Map::new();
        backend.insert("gcs".to_string(), to_value(&self.backend)?);
        let mut terraform = Map::new();
        terraform.insert("required_providers".to_string(), Value::Object(required_providers));
        terraform.insert("backend".to_string(), Value::Object(backend));

        let mut doc = Map::new();
        doc.insert("terraform".to_string(), Value::Object(terraform));
        doc.insert("provider".to_string(), to_value(&providers)?);
        if !data.is_empty() {
            doc.insert("data".to_string(), to_value(&data)?);
        }
        doc.insert("resource".to_string(), to_value(&resources)?);
        if !self.outputs.is_empty() {
            doc.insert("output".to_string(), to_value(&self.outputs)?);
        }
        Ok(Value::Object(doc))
    }
}

fn to_value(value: &impl Serialize) -> Result<Value, StackError> {
    serde_json::to_value(value).map_err(|e| StackError::synth(e))
}
