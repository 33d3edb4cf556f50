//! Graph structure and node management.
//!
//! The ProcessingGraph owns every node. Edges live on the downstream node as
//! an id-based input slot, so the graph can reorder or drop storage without
//! leaving dangling references behind. No method here traverses or executes
//! the graph; that is the engine's job.

use crate::core::error::{GraphError, GraphResult, NodeId};
use crate::core::node::{Category, FilterNode, NodeKind};
use crate::core::types::{ImageValue, Params};
use crate::graph::connection::Connection;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

/// A node instance in the graph.
///
/// Contains the filter implementation, its single input slot and its cached
/// output.
#[derive(Clone)]
pub struct GraphNode {
    /// Unique identifier
    pub id: NodeId,
    /// The filter implementation
    pub filter: Box<dyn FilterNode>,
    /// Optional display name override
    pub label: Option<String>,
    /// Upstream node feeding the input slot
    input: Option<NodeId>,
    /// Most recently computed output
    output: ImageValue,
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("filter", &self.filter.metadata().id)
            .field("label", &self.label)
            .field("input", &self.input)
            .field("output", &self.output.metadata())
            .finish()
    }
}

impl GraphNode {
    /// Create a new graph node with a filter.
    pub fn new(id: NodeId, filter: Box<dyn FilterNode>) -> Self {
        Self {
            id,
            filter,
            label: None,
            input: None,
            output: ImageValue::empty(),
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the display name (label or filter name).
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.filter.metadata().name)
    }

    /// Variant and operation tag.
    pub fn kind(&self) -> NodeKind {
        self.filter.metadata().kind()
    }

    /// Variant.
    pub fn category(&self) -> Category {
        self.filter.metadata().category
    }

    /// Upstream node feeding the input slot.
    pub fn input(&self) -> Option<NodeId> {
        self.input
    }

    /// Upstream nodes, in slot order.
    pub fn inputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.input.iter().copied()
    }

    /// Most recently computed output.
    pub fn output(&self) -> &ImageValue {
        &self.output
    }

    pub(crate) fn set_output(&mut self, output: ImageValue) {
        self.output = output;
    }

    /// Current numeric parameters.
    pub fn params(&self) -> Params {
        self.filter.params()
    }

    /// Merge numeric parameters into the filter.
    pub fn set_params(&mut self, params: &Params) {
        self.filter.set_params(params);
    }
}

/// The main processing graph structure.
///
/// Uses IndexMap to maintain insertion order for consistent iteration.
#[derive(Debug, Clone)]
pub struct ProcessingGraph {
    /// All nodes in the graph, indexed by ID.
    nodes: IndexMap<NodeId, GraphNode>,
    /// Next id handed out by `add_filter`.
    next_id: u32,
}

impl ProcessingGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            next_id: 1,
        }
    }

    // ========================================================================
    // Node Management
    // ========================================================================

    /// Register a node.
    ///
    /// Fails with [`GraphError::DuplicateId`] if the id is taken.
    pub fn add_node(&mut self, node: GraphNode) -> GraphResult<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        self.next_id = self.next_id.max(id.get().saturating_add(1));
        self.nodes.insert(id, node);
        log::debug!("Added node {}", id);
        Ok(id)
    }

    /// Add a node from a filter under a freshly allocated id.
    ///
    /// Allocation wraps back to 1 once the id space is used up.
    pub fn add_filter(&mut self, filter: Box<dyn FilterNode>) -> NodeId {
        while self.nodes.contains_key(&NodeId(self.next_id)) {
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        }
        let id = NodeId(self.next_id);
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        self.nodes.insert(id, GraphNode::new(id, filter));
        log::debug!("Added node {}", id);
        id
    }

    /// Remove a node from the graph.
    ///
    /// Also clears every input slot that referenced it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<GraphNode> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::UnknownNode(id))?;

        for other in self.nodes.values_mut() {
            if other.input == Some(id) {
                other.input = None;
            }
        }
        log::debug!("Removed node {}", id);
        Ok(node)
    }

    /// Get a reference to a node.
    pub fn get_node(&self, id: NodeId) -> GraphResult<&GraphNode> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    /// Get a mutable reference to a node.
    pub fn get_node_mut(&mut self, id: NodeId) -> GraphResult<&mut GraphNode> {
        self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))
    }

    /// Check if a node exists.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Get all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Merge numeric parameters into a node.
    pub fn set_params(&mut self, id: NodeId, params: &Params) -> GraphResult<()> {
        self.get_node_mut(id)?.set_params(params);
        Ok(())
    }

    /// Configure the file path of a source or sink.
    pub fn set_path(&mut self, id: NodeId, path: impl Into<PathBuf>) -> GraphResult<()> {
        if self.get_node_mut(id)?.filter.set_path(path.into()) {
            Ok(())
        } else {
            Err(GraphError::PathNotSupported(id))
        }
    }

    /// The cached output of a node.
    pub fn output(&self, id: NodeId) -> GraphResult<&ImageValue> {
        Ok(self.get_node(id)?.output())
    }

    // ========================================================================
    // Connection Management
    // ========================================================================

    /// Point `to`'s input slot at `from`.
    ///
    /// Replaces any previous connection into that slot and returns the node it
    /// used to reference. Cycles are not rejected here; the engine reports
    /// them when the graph is executed.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> GraphResult<Option<NodeId>> {
        if !self.has_node(from) {
            return Err(GraphError::UnknownNode(from));
        }
        let node = self.get_node_mut(to)?;
        let previous = node.input.replace(from);
        log::debug!("Connected {} -> {}", from, to);
        Ok(previous)
    }

    /// Clear `to`'s input slot, returning the node it referenced.
    pub fn disconnect(&mut self, to: NodeId) -> GraphResult<Option<NodeId>> {
        Ok(self.get_node_mut(to)?.input.take())
    }

    /// Upstream node feeding `id`.
    pub fn inputs_of(&self, id: NodeId) -> GraphResult<Option<NodeId>> {
        Ok(self.get_node(id)?.input())
    }

    /// Get all connections.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.nodes
            .values()
            .filter_map(|node| node.input.map(|from| Connection::new(from, node.id)))
    }

    /// Get all connections from a node.
    pub fn connections_from(&self, id: NodeId) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.from == id)
    }

    /// Get the number of connections.
    pub fn connection_count(&self) -> usize {
        self.nodes.values().filter(|n| n.input.is_some()).count()
    }

    // ========================================================================
    // Graph Analysis
    // ========================================================================

    /// Get all nodes that depend on the given node (downstream).
    pub fn get_downstream(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.connections_from(id).map(|c| c.to).collect();

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                result.push(current);
                queue.extend(self.connections_from(current).map(|c| c.to));
            }
        }

        result
    }

    /// Get all nodes that the given node depends on (upstream).
    pub fn get_upstream(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.nodes.get(&id).and_then(|n| n.input);

        while let Some(upstream) = current {
            if !visited.insert(upstream) {
                break;
            }
            result.push(upstream);
            current = self.nodes.get(&upstream).and_then(|n| n.input);
        }

        result
    }

    /// Get nodes with an empty input slot.
    pub fn source_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.input.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// Get nodes nothing else reads from.
    pub fn sink_nodes(&self) -> Vec<NodeId> {
        let fed: HashSet<NodeId> = self.connections().map(|c| c.from).collect();
        self.node_ids().filter(|id| !fed.contains(id)).collect()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clear all nodes and connections.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Default for ProcessingGraph {
    fn default() -> Self {
        Self::new()
    }
}
