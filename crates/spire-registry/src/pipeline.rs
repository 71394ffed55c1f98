//! Pipelines: the world graph shaders are compiled against.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: world names
//! - Edges: import operators, pointing from the producing world to the
//!   consuming one
//!
//! The graph is kept acyclic at insertion time, so a topological order
//! always exists. Ties in that order are broken by declaration order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use spire_core::{PipelineError, Span};

use crate::{Attributes, PINNED_ATTRIBUTE};

/// A named stage or target domain of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub name: String,
    /// Pipeline-declared boundary whose output must be materialized.
    pub is_abstract: bool,
    pub attributes: Attributes,
    pub span: Span,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            attributes: Attributes::new(),
            span: Span::default(),
        }
    }

    /// An abstract world, e.g. the pipeline's final fragment output.
    pub fn abstract_world(name: impl Into<String>) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(name)
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the world asks for its components to be kept as outputs.
    pub fn is_pinned(&self) -> bool {
        self.attributes.contains_key(PINNED_ATTRIBUTE)
    }
}

/// A world DAG with its import operators.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    worlds: IndexMap<String, World>,
    graph: DiGraph<String, String>,
    nodes: FxHashMap<String, NodeIndex>,
    /// World names in topological order, recomputed on every change.
    topology: Vec<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worlds: IndexMap::new(),
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            topology: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a world.
    pub fn add_world(&mut self, world: World) -> Result<(), PipelineError> {
        if self.worlds.contains_key(&world.name) {
            return Err(PipelineError::DuplicateWorld {
                pipeline: self.name.clone(),
                world: world.name,
            });
        }
        let node = self.graph.add_node(world.name.clone());
        self.nodes.insert(world.name.clone(), node);
        self.worlds.insert(world.name.clone(), world);
        self.recompute_topology();
        Ok(())
    }

    /// Declare an import operator that moves values from `from` to `to`.
    pub fn add_import(
        &mut self,
        operator: impl Into<String>,
        from: &str,
        to: &str,
    ) -> Result<(), PipelineError> {
        let from_node = self.node(from)?;
        let to_node = self.node(to)?;

        if from_node == to_node || has_path_connecting(&self.graph, to_node, from_node, None) {
            return Err(PipelineError::CyclicImport {
                pipeline: self.name.clone(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.graph.add_edge(from_node, to_node, operator.into());
        self.recompute_topology();
        Ok(())
    }

    pub fn world(&self, name: &str) -> Option<&World> {
        self.worlds.get(name)
    }

    /// Worlds in declaration order.
    pub fn worlds(&self) -> impl Iterator<Item = &World> {
        self.worlds.values()
    }

    pub fn is_abstract_world(&self, name: &str) -> bool {
        self.worlds.get(name).is_some_and(|w| w.is_abstract)
    }

    /// World names in topological order (producers before consumers).
    pub fn topological_order(&self) -> &[String] {
        &self.topology
    }

    /// Position of a world in [`Self::topological_order`].
    pub fn topology_rank(&self, world: &str) -> Option<usize> {
        self.topology.iter().position(|w| w == world)
    }

    /// Whether values computed in `from` can flow into `to`.
    ///
    /// A world is reachable from itself.
    pub fn is_world_reachable(&self, from: &str, to: &str) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Names of the import operators on the direct edge `from -> to`.
    pub fn imports_between(&self, from: &str, to: &str) -> Vec<&str> {
        let (Some(&a), Some(&b)) = (self.nodes.get(from), self.nodes.get(to)) else {
            return Vec::new();
        };
        self.graph
            .edges_connecting(a, b)
            .map(|edge| edge.weight().as_str())
            .collect()
    }

    fn node(&self, world: &str) -> Result<NodeIndex, PipelineError> {
        self.nodes
            .get(world)
            .copied()
            .ok_or_else(|| PipelineError::UnknownWorld {
                pipeline: self.name.clone(),
                world: world.to_string(),
            })
    }

    /// Kahn's algorithm, always releasing the earliest-declared ready world.
    fn recompute_topology(&mut self) {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(index)) = ready.pop() {
            let node = NodeIndex::new(index);
            order.push(self.graph[node].clone());
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }

        self.topology = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vs -> ps -> fs, declared out of order.
    fn forward() -> Pipeline {
        let mut pipeline = Pipeline::new("Forward");
        pipeline.add_world(World::new("fs")).unwrap();
        pipeline.add_world(World::new("vs")).unwrap();
        pipeline.add_world(World::new("ps")).unwrap();
        pipeline.add_import("vertexOut", "vs", "ps").unwrap();
        pipeline.add_import("fragmentOut", "ps", "fs").unwrap();
        pipeline
    }

    #[test]
    fn topological_order_follows_imports() {
        let pipeline = forward();
        assert_eq!(pipeline.topological_order(), ["vs", "ps", "fs"]);
        assert_eq!(pipeline.topology_rank("fs"), Some(2));
        assert_eq!(pipeline.topology_rank("gs"), None);
    }

    #[test]
    fn unconnected_worlds_keep_declaration_order() {
        let mut pipeline = Pipeline::new("P");
        for name in ["c", "a", "b"] {
            pipeline.add_world(World::new(name)).unwrap();
        }
        assert_eq!(pipeline.topological_order(), ["c", "a", "b"]);
    }

    #[test]
    fn reachability() {
        let pipeline = forward();
        assert!(pipeline.is_world_reachable("vs", "fs"));
        assert!(pipeline.is_world_reachable("ps", "ps"));
        assert!(!pipeline.is_world_reachable("fs", "vs"));
        assert!(!pipeline.is_world_reachable("vs", "nowhere"));
        assert_eq!(pipeline.imports_between("vs", "ps"), vec!["vertexOut"]);
    }

    #[test]
    fn rejects_cycles_and_unknown_worlds() {
        let mut pipeline = forward();
        assert_eq!(
            pipeline.add_import("back", "fs", "vs"),
            Err(PipelineError::CyclicImport {
                pipeline: "Forward".into(),
                from: "fs".into(),
                to: "vs".into(),
            })
        );
        assert!(matches!(
            pipeline.add_import("x", "vs", "gs"),
            Err(PipelineError::UnknownWorld { .. })
        ));
        assert!(matches!(
            pipeline.add_world(World::new("vs")),
            Err(PipelineError::DuplicateWorld { .. })
        ));
        assert_eq!(pipeline.topological_order(), ["vs", "ps", "fs"]);
    }

    #[test]
    fn abstract_and_pinned_worlds() {
        let mut pipeline = Pipeline::new("P");
        pipeline
            .add_world(World::abstract_world("out").with_attribute(PINNED_ATTRIBUTE, ""))
            .unwrap();
        pipeline.add_world(World::new("vs")).unwrap();
        assert!(pipeline.is_abstract_world("out"));
        assert!(!pipeline.is_abstract_world("vs"));
        assert!(pipeline.world("out").unwrap().is_pinned());
    }
}
