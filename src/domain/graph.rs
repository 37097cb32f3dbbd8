//! Recipe graph analysis
//!
//! Builds the material -> component graph of a whole catalog so that
//! cycles, evaluation order and where-used queries can be answered without
//! pricing anything. Uses petgraph for graph operations.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::catalog::{ComponentRef, MaterialRecord};
use super::id::MaterialId;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Recipe graph contains a cycle through material {0}")]
    Cycle(MaterialId),
}

/// Graph of every active recipe line in a catalog
///
/// Edge direction is parent -> component, so a material's outgoing
/// neighbors are its ingredients.
#[derive(Debug, Default)]
pub struct BomGraph {
    /// The underlying directed graph; edge weight is the line position
    graph: DiGraph<ComponentRef, u32>,

    /// Map from node to node index
    node_map: HashMap<ComponentRef, NodeIndex>,
}

impl BomGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from recipes; inactive lines are left out
    pub fn from_materials<'a>(materials: impl IntoIterator<Item = &'a MaterialRecord>) -> Self {
        let mut graph = Self::new();

        for material in materials {
            let parent = graph.add_node(ComponentRef::Material(material.id.clone()));
            for edge in material.components.iter().filter(|e| e.active) {
                let child = graph.add_node(edge.target.clone());
                graph.graph.add_edge(parent, child, edge.position);
            }
        }

        graph
    }

    /// Adds a node if missing and returns its index
    fn add_node(&mut self, node: ComponentRef) -> NodeIndex {
        if let Some(idx) = self.node_map.get(&node) {
            return *idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_map.insert(node, idx);
        idx
    }

    /// Returns every cycle, each as the sorted list of materials on it
    pub fn cycles(&self) -> Vec<Vec<MaterialId>> {
        let mut cycles: Vec<Vec<MaterialId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || scc
                        .first()
                        .is_some_and(|idx| self.graph.find_edge(*idx, *idx).is_some())
            })
            .map(|scc| {
                let mut members: Vec<MaterialId> =
                    scc.iter().filter_map(|idx| self.material_at(*idx)).collect();
                members.sort();
                members
            })
            .collect();

        cycles.sort();
        cycles
    }

    /// Returns true if any recipe (transitively) contains itself
    pub fn has_cycle(&self) -> bool {
        !self.cycles().is_empty()
    }

    /// Returns all materials ordered so that ingredients come before the
    /// recipes that use them
    pub fn evaluation_order(&self) -> Result<Vec<MaterialId>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .rev()
                .filter_map(|idx| self.material_at(idx))
                .collect()),
            Err(cycle) => {
                let node = cycle.node_id();
                let id = self
                    .material_at(node)
                    .or_else(|| self.cycles().into_iter().flatten().next());
                match id {
                    Some(id) => Err(GraphError::Cycle(id)),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Returns the materials that directly use a node, sorted
    pub fn where_used(&self, node: &ComponentRef) -> Vec<MaterialId> {
        let Some(idx) = self.node_map.get(node) else {
            return vec![];
        };

        let mut users: Vec<MaterialId> = self
            .graph
            .neighbors_directed(*idx, Direction::Incoming)
            .filter_map(|idx| self.material_at(idx))
            .collect();
        users.sort();
        users.dedup();
        users
    }

    /// Returns the direct components of a material, in line order
    pub fn components(&self, material: &MaterialId) -> Vec<ComponentRef> {
        let Some(idx) = self.node_map.get(&ComponentRef::Material(material.clone())) else {
            return vec![];
        };

        let mut edges: Vec<(u32, ComponentRef)> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .filter_map(|e| {
                self.graph
                    .node_weight(e.target())
                    .map(|node| (*e.weight(), node.clone()))
            })
            .collect();
        edges.sort();
        edges.into_iter().map(|(_, node)| node).collect()
    }

    fn material_at(&self, idx: NodeIndex) -> Option<MaterialId> {
        match self.graph.node_weight(idx) {
            Some(ComponentRef::Material(id)) => Some(id.clone()),
            _ => None,
        }
    }

    /// Returns true if the graph contains the node
    pub fn contains(&self, node: &ComponentRef) -> bool {
        self.node_map.contains_key(node)
    }

    /// Returns the number of nodes (materials and items)
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
