//! Depth-first topology analysis.
//!
//! [`TopologyAnalyzer`] snapshots the graph's input slots and walks them in
//! post-order with a three-state marker per node:
//!
//! ```text
//! Unvisited --> Visiting --> Visited
//! ```
//!
//! A node becomes `Visiting` when it is pushed on the walk stack and `Visited`
//! once every input has been visited and the node itself has been handed to
//! the visitor. Reaching a `Visiting` node again is a back edge, i.e. a cycle.
//! The walk uses an explicit stack, so graph depth is not bounded by the call
//! stack.

use crate::core::error::{GraphError, GraphResult, NodeId};
use crate::graph::structure::ProcessingGraph;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Per-node traversal state within one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Not reached yet.
    Unvisited,
    /// On the active path.
    Visiting,
    /// Fully processed; terminal.
    Visited,
}

struct Frame {
    node: NodeId,
    next_input: usize,
}

/// Analyzer for graph topology.
#[derive(Debug, Clone)]
pub struct TopologyAnalyzer {
    /// Upstream ids per node, in graph iteration order.
    inputs: IndexMap<NodeId, Vec<NodeId>>,
}

impl TopologyAnalyzer {
    /// Snapshot the graph's edges.
    ///
    /// Fails fast with [`GraphError::UnknownNode`] if any input slot
    /// references a node that is not in the graph.
    pub fn new(graph: &ProcessingGraph) -> GraphResult<Self> {
        let mut inputs = IndexMap::with_capacity(graph.node_count());
        for node in graph.nodes() {
            let upstream: Vec<NodeId> = node.inputs().collect();
            if let Some(&missing) = upstream.iter().find(|id| !graph.has_node(**id)) {
                return Err(GraphError::UnknownNode(missing));
            }
            inputs.insert(node.id, upstream);
        }
        Ok(Self { inputs })
    }

    /// Walk every node in post-order, calling `visit` once per node after all
    /// of its inputs have been visited.
    ///
    /// Stops at the first back edge with [`GraphError::CycleDetected`], whose
    /// path runs from the node that closed the cycle along input references
    /// back to itself. Nodes visited before the cycle was found stay visited.
    pub fn walk<F>(&self, mut visit: F) -> GraphResult<()>
    where
        F: FnMut(NodeId),
    {
        let mut state: HashMap<NodeId, VisitState> = HashMap::with_capacity(self.inputs.len());
        let mut stack: Vec<Frame> = Vec::new();

        for &root in self.inputs.keys() {
            if state.get(&root).copied().unwrap_or(VisitState::Unvisited) != VisitState::Unvisited {
                continue;
            }

            state.insert(root, VisitState::Visiting);
            stack.push(Frame {
                node: root,
                next_input: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let upstream = self.inputs.get(&frame.node).and_then(|i| i.get(frame.next_input));

                match upstream.copied() {
                    Some(dep) => {
                        frame.next_input += 1;
                        match state.get(&dep).copied().unwrap_or(VisitState::Unvisited) {
                            VisitState::Visited => {}
                            VisitState::Visiting => {
                                let start = stack.iter().position(|f| f.node == dep).unwrap_or(0);
                                let mut path: Vec<NodeId> =
                                    stack[start..].iter().map(|f| f.node).collect();
                                path.push(dep);
                                return Err(GraphError::CycleDetected { path });
                            }
                            VisitState::Unvisited => {
                                state.insert(dep, VisitState::Visiting);
                                stack.push(Frame {
                                    node: dep,
                                    next_input: 0,
                                });
                            }
                        }
                    }
                    None => {
                        let node = frame.node;
                        stack.pop();
                        visit(node);
                        state.insert(node, VisitState::Visited);
                    }
                }
            }
        }

        Ok(())
    }

    /// Post-order evaluation order: every node after all of its inputs.
    pub fn evaluation_order(&self) -> GraphResult<Vec<NodeId>> {
        let mut order = Vec::with_capacity(self.inputs.len());
        self.walk(|id| order.push(id))?;
        Ok(order)
    }

    /// The first cycle found, if any.
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        match self.walk(|_| {}) {
            Err(GraphError::CycleDetected { path }) => Some(path),
            _ => None,
        }
    }

    /// Check if the graph has any cycles.
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Number of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        self.inputs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::Preview;
    use crate::graph::structure::GraphNode;
    use proptest::prelude::*;

    fn graph_with(ids: &[u32]) -> ProcessingGraph {
        let mut graph = ProcessingGraph::new();
        for &id in ids {
            graph
                .add_node(GraphNode::new(NodeId(id), Box::new(Preview)))
                .unwrap();
        }
        graph
    }

    fn position(order: &[NodeId], id: u32) -> usize {
        order.iter().position(|&n| n == NodeId(id)).unwrap()
    }

    #[test]
    fn test_chain_order() {
        let mut graph = graph_with(&[3, 2, 1]);
        graph.connect(NodeId(1), NodeId(2)).unwrap();
        graph.connect(NodeId(2), NodeId(3)).unwrap();

        let order = TopologyAnalyzer::new(&graph).unwrap().evaluation_order().unwrap();
        assert_eq!(order, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_shared_dependency_visited_once() {
        // 1 feeds both 2 and 3.
        let mut graph = graph_with(&[2, 3, 1]);
        graph.connect(NodeId(1), NodeId(2)).unwrap();
        graph.connect(NodeId(1), NodeId(3)).unwrap();

        let order = TopologyAnalyzer::new(&graph).unwrap().evaluation_order().unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order.iter().filter(|&&n| n == NodeId(1)).count(), 1);
        assert!(position(&order, 1) < position(&order, 2));
        assert!(position(&order, 1) < position(&order, 3));
    }

    #[test]
    fn test_cycle_path() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.connect(NodeId(1), NodeId(2)).unwrap();
        graph.connect(NodeId(2), NodeId(3)).unwrap();
        graph.connect(NodeId(3), NodeId(1)).unwrap();

        let analyzer = TopologyAnalyzer::new(&graph).unwrap();
        let mut visited = Vec::new();
        let result = analyzer.walk(|id| visited.push(id));

        assert_eq!(
            result.unwrap_err(),
            GraphError::CycleDetected {
                path: vec![NodeId(1), NodeId(3), NodeId(2), NodeId(1)]
            }
        );
        assert!(visited.is_empty());
        assert!(analyzer.has_cycle());
    }

    #[test]
    fn test_self_loop() {
        let mut graph = graph_with(&[7]);
        graph.connect(NodeId(7), NodeId(7)).unwrap();

        let analyzer = TopologyAnalyzer::new(&graph).unwrap();
        assert_eq!(analyzer.find_cycle(), Some(vec![NodeId(7), NodeId(7)]));
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        // 1 -> 2 is fine and visited first; 3 <-> 4 is a cycle.
        let mut graph = graph_with(&[1, 2, 3, 4]);
        graph.connect(NodeId(1), NodeId(2)).unwrap();
        graph.connect(NodeId(3), NodeId(4)).unwrap();
        graph.connect(NodeId(4), NodeId(3)).unwrap();

        let mut visited = Vec::new();
        let result = TopologyAnalyzer::new(&graph).unwrap().walk(|id| visited.push(id));
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
        assert_eq!(visited, vec![NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ProcessingGraph::new();
        let analyzer = TopologyAnalyzer::new(&graph).unwrap();
        assert!(analyzer.evaluation_order().unwrap().is_empty());
        assert!(!analyzer.has_cycle());
        assert_eq!(analyzer.node_count(), 0);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<u32> = (1..=50_000).rev().collect();
        let mut graph = graph_with(&ids);
        for id in 1..50_000 {
            graph.connect(NodeId(id), NodeId(id + 1)).unwrap();
        }

        let order = TopologyAnalyzer::new(&graph).unwrap().evaluation_order().unwrap();
        assert_eq!(order.first(), Some(&NodeId(1)));
        assert_eq!(order.last(), Some(&NodeId(50_000)));
    }

    proptest! {
        /// For any acyclic graph, each edge's upstream comes first and every
        /// node appears exactly once.
        #[test]
        fn prop_order_respects_edges(
            len in 1usize..40,
            parents in proptest::collection::vec(any::<prop::sample::Index>(), 40),
            links in proptest::collection::vec(any::<bool>(), 40),
        ) {
            // Node i may only read from a node with a smaller index.
            let ids: Vec<u32> = (1..=len as u32).collect();
            let mut graph = graph_with(&ids);
            for i in 1..len {
                if links[i] {
                    let parent = parents[i].index(i);
                    graph.connect(NodeId(ids[parent]), NodeId(ids[i])).unwrap();
                }
            }

            let order = TopologyAnalyzer::new(&graph).unwrap().evaluation_order().unwrap();
            prop_assert_eq!(order.len(), len);
            for conn in graph.connections() {
                let from = order.iter().position(|&n| n == conn.from).unwrap();
                let to = order.iter().position(|&n| n == conn.to).unwrap();
                prop_assert!(from < to);
            }
        }
    }
}
