//! Graph module for managing processing graphs.
//!
//! A processing graph is a set of nodes, each with at most one input slot
//! referencing another node. Edges run from a node's output into the slot of
//! the node that reads it.

pub mod structure;
pub mod connection;
pub mod topology;

// Re-export commonly used types
pub use structure::{GraphNode, ProcessingGraph};
pub use connection::Connection;
pub use topology::{TopologyAnalyzer, VisitState};
