use crate::error::DagError;
use petgraph::Direction;
use resources::Address;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

/// Edges carry no data; an edge `a -> b` means `b` depends on `a`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyEdge;
impl Display for EmptyEdge {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

pub type DagResult<T> = Result<T, DagError>;

/// A declared descriptor together with the scope it was declared in.
#[derive(Clone)]
pub struct ResourceNode {
    pub address: Address,
    /// Parent scope id (the stack name).
    pub parent: String,
    /// Serialised descriptor body, exactly as the engine expects it.
    pub body: Value,
    /// Explicit ordering constraints, rendered as `depends_on`.
    pub depends_on: Vec<Address>,
    /// Every upstream node: interpolated references plus `depends_on`.
    pub relations: BTreeSet<Address>,
}

impl ResourceNode {
    /// Construct path recorded in the block metadata, `<parent>/<name>`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.parent, self.address.name)
    }

    /// The body as written to the engine configuration: the descriptor
    /// fields plus the `//` metadata entry and any `depends_on` list.
    pub fn rendered_body(&self) -> Value {
        let mut body = self.body.clone();
        if let Value::Object(map) = &mut body {
            map.insert("//".to_string(), json!({ "metadata": { "path": self.path() } }));
            if !self.depends_on.is_empty() {
                let deps = self
                    .depends_on
                    .iter()
                    .map(|a| Value::String(a.to_string()))
                    .collect();
                map.insert("depends_on".to_string(), Value::Array(deps));
            }
        }
        body
    }
}

impl Debug for ResourceNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ResourceNode {{ address: {}, parent: {}, relations: {:?} }}",
            self.address,
            self.parent,
            self.relations.iter().map(ToString::to_string).collect::<Vec<_>>()
        )
    }
}

pub enum TransitiveDirection {
    /// Everything the node depends on.
    Upstream,
    /// Everything that depends on the node.
    Downstream,
}

impl From<TransitiveDirection> for Direction {
    fn from(value: TransitiveDirection) -> Self {
        match value {
            TransitiveDirection::Upstream => Direction::Incoming,
            TransitiveDirection::Downstream => Direction::Outgoing,
        }
    }
}
