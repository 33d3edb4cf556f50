//! Connection types for the graph.

use crate::core::error::NodeId;
use serde::{Deserialize, Serialize};

/// A directed edge: `from`'s output feeds `to`'s input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Upstream node.
    pub from: NodeId,
    /// Downstream node.
    pub to: NodeId,
}

impl Connection {
    /// Create a new connection.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    /// Whether this edge starts and ends at the same node.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection() {
        let conn = Connection::new(NodeId(1), NodeId(2));
        assert_eq!(conn.from, NodeId(1));
        assert_eq!(conn.to, NodeId(2));
        assert!(!conn.is_self_loop());
        assert!(Connection::new(NodeId(5), NodeId(5)).is_self_loop());
    }
}
