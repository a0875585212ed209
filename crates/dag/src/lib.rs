pub mod error;
pub mod references;
pub mod types;

pub use crate::error::DagError;
use crate::references::extract_references;
use crate::types::{DagResult, EmptyEdge, ResourceNode, TransitiveDirection};
use log::{debug, info};
use once_cell::sync::Lazy;
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::prelude::EdgeRef;
use petgraph::Direction;
use regex::Regex;
use resources::{Address, BlockKind, Declare};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Write;
use std::path::Path;

static NODE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid node id regex"));

/// Directed acyclic graph of resource descriptors.
///
/// Nodes are added strictly in declaration order and a node may only refer
/// to nodes already in the graph, so the insertion order is always a valid
/// deployment order. The provider binding is the single root: every other
/// node hangs off it.
///
/// Edges point from a dependency to its dependent.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    pub graph: DiGraph<ResourceNode, EmptyEdge>,
    pub addr_to_index: HashMap<Address, NodeIndex>,
    provider: Option<NodeIndex>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the provider. Must be the first declaration in the graph.
    pub fn bind_provider(&mut self, parent: &str, provider: &impl Declare) -> DagResult<Address> {
        if provider.block() != BlockKind::Provider {
            return Err(DagError::provider(format!(
                "`{}` is not a provider",
                provider.kind()
            )));
        }
        if self.provider.is_some() || self.graph.node_count() > 0 {
            return Err(DagError::provider(
                "the provider must be bound exactly once, before any other declaration",
            ));
        }

        let address = Address::provider(provider.kind());
        let node = ResourceNode {
            address: address.clone(),
            parent: parent.to_string(),
            body: provider.to_body()?,
            depends_on: Vec::new(),
            relations: BTreeSet::new(),
        };
        let idx = self.graph.add_node(node);
        self.addr_to_index.insert(address.clone(), idx);
        self.provider = Some(idx);
        debug!("bound provider {address}");
        Ok(address)
    }

    /// Add a descriptor under `parent` with engine name `id`.
    ///
    /// Every interpolation in the serialised body and every entry of
    /// `depends_on` must name a node that is already declared.
    pub fn declare(
        &mut self,
        parent: &str,
        id: &str,
        descriptor: &impl Declare,
        depends_on: &[Address],
    ) -> DagResult<Address> {
        let Some(provider_idx) = self.provider else {
            return Err(DagError::provider(format!(
                "cannot declare `{}.{id}` before the provider is bound",
                descriptor.kind()
            )));
        };
        if !NODE_ID.is_match(id) {
            return Err(DagError::invalid_id(id));
        }

        let address = match descriptor.block() {
            BlockKind::Resource => Address::resource(descriptor.kind(), id),
            BlockKind::Data => Address::data(descriptor.kind(), id),
            BlockKind::Provider => {
                return Err(DagError::provider(format!(
                    "`{}` must be bound with bind_provider",
                    descriptor.kind()
                )))
            }
        };
        if self.addr_to_index.contains_key(&address) {
            return Err(DagError::duplicate(&address));
        }

        let body = descriptor.to_body()?;
        let mut relations = extract_references(&body);
        relations.extend(depends_on.iter().cloned());

        let mut upstream = Vec::with_capacity(relations.len());
        for dep in &relations {
            match self.addr_to_index.get(dep) {
                Some(idx) => upstream.push(*idx),
                None => return Err(DagError::missing_dependency(&address, dep)),
            }
        }

        let idx = self.graph.add_node(ResourceNode {
            address: address.clone(),
            parent: parent.to_string(),
            body,
            depends_on: depends_on.to_vec(),
            relations,
        });
        self.addr_to_index.insert(address.clone(), idx);
        self.graph.add_edge(provider_idx, idx, EmptyEdge);
        for dep_idx in upstream {
            if dep_idx != provider_idx {
                self.graph.add_edge(dep_idx, idx, EmptyEdge);
            }
        }
        debug!("declared {address}");
        Ok(address)
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceNode> {
        self.addr_to_index
            .get(address)
            .map(|&idx| &self.graph[idx])
    }

    pub fn get_index(&self, address: &Address) -> Option<NodeIndex> {
        self.addr_to_index.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in the order they were declared.
    pub fn declaration_order(&self) -> Vec<&ResourceNode> {
        self.graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// True when `first` was declared before `second`.
    pub fn declared_before(&self, first: &Address, second: &Address) -> bool {
        match (self.get_index(first), self.get_index(second)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    pub fn toposort(&self) -> DagResult<Vec<NodeIndex>> {
        let order = toposort(&self.graph, None).map_err(|_| {
            let cyclic = kosaraju_scc(&self.graph)
                .into_iter()
                .find(|scc| scc.len() > 1)
                .unwrap_or_default();

            let cycle = cyclic
                .into_iter()
                .map(|idx| self.graph[idx].address.to_string())
                .collect();

            DagError::CycleDetected(cycle)
        })?;

        Ok(order)
    }

    /// Nodes in topological order, optionally restricted to `included`.
    pub fn ordered_nodes(
        &self,
        included: Option<&BTreeSet<NodeIndex>>,
    ) -> DagResult<Vec<&ResourceNode>> {
        let order = self.toposort()?;
        Ok(order
            .into_iter()
            .filter(|idx| match included {
                Some(inc) => inc.contains(idx),
                None => true,
            })
            .map(|idx| &self.graph[idx])
            .collect())
    }

    pub fn traverse(&self, start: NodeIndex, direction: Direction) -> BTreeSet<NodeIndex> {
        let mut visited = BTreeSet::new();
        let mut stack = VecDeque::new();
        stack.push_back(start);

        while let Some(current_idx) = stack.pop_back() {
            for dep_idx in self.graph.neighbors_directed(current_idx, direction) {
                if visited.insert(dep_idx) {
                    stack.push_back(dep_idx);
                }
            }
        }

        visited
    }

    /// All nodes reachable from `address` in `direction`, topologically
    /// ordered. The start node itself is not included.
    pub fn transitive_closure(
        &self,
        address: &Address,
        direction: TransitiveDirection,
    ) -> DagResult<Vec<&ResourceNode>> {
        let start_idx = self
            .get_index(address)
            .ok_or_else(|| DagError::not_found(address))?;

        let visited = self.traverse(start_idx, direction.into());
        self.ordered_nodes(Some(&visited))
    }

    /// Re-check every node: each reference resolves to a node declared
    /// earlier, and the graph has no cycle.
    pub fn verify_closure(&self) -> DagResult<()> {
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let refs = extract_references(&node.body);
            for dep in refs.iter().chain(node.depends_on.iter()) {
                match self.get_index(dep) {
                    Some(dep_idx) if dep_idx < idx => {}
                    _ => return Err(DagError::missing_dependency(&node.address, dep)),
                }
            }
        }
        self.toposort()?;
        info!(
            "verified {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        Ok(())
    }

    /// DOT rendering with node labels set to engine addresses.
    pub fn to_dot_string(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {{");
        let _ = writeln!(dot, "    rankdir=LR;");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let _ = writeln!(dot, "    {} [label=\"{}\"];", idx.index(), node.address);
        }

        for edge in self.graph.edge_references() {
            let _ = writeln!(
                dot,
                "    {} -> {};",
                edge.source().index(),
                edge.target().index(),
            );
        }
        let _ = writeln!(dot, "}}");

        dot
    }

    /// Write the dependency graph to the given path in DOT format.
    pub fn export_dot_to<P: AsRef<Path>>(&self, path: P) -> DagResult<()> {
        std::fs::write(path, self.to_dot_string())?;
        Ok(())
    }
}
