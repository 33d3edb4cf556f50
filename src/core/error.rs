//! Error types for Pixelflow.
//!
//! Errors come in two layers:
//! - Structural errors ([`GraphError`]) abort the operation that triggered them.
//! - Data-level errors ([`ExecutionError`]) are absorbed by the engine at the
//!   node that raised them and reported as warnings, so independent branches
//!   keep running.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Unique identifier for a node in the graph.
///
/// Ids are assigned by the graph owner and are never reused while the node
/// they name is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node ID from a raw integer.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level error type for Pixelflow.
#[derive(Error, Debug)]
pub enum PixelflowError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors related to graph structure and traversal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("Node {0} not found")]
    UnknownNode(NodeId),

    #[error("Node {0} already exists")]
    DuplicateId(NodeId),

    #[error("Cycle detected along path {}", format_path(.path))]
    CycleDetected { path: Vec<NodeId> },

    #[error("Node {0} does not take a file path")]
    PathNotSupported(NodeId),

    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),
}

fn format_path(path: &[NodeId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl GraphError {
    /// Nodes involved in this error.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match self {
            GraphError::UnknownNode(id)
            | GraphError::DuplicateId(id)
            | GraphError::PathNotSupported(id) => vec![*id],
            GraphError::CycleDetected { path } => path.clone(),
            GraphError::UnknownOperation(_) => vec![],
        }
    }
}

/// Data-level errors raised by a node while processing.
///
/// None of these abort an execution pass. The engine records them against the
/// node and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionError {
    #[error("Node {node_id} received an empty input image")]
    EmptyInput { node_id: NodeId },

    #[error("Node {node_id} has no file path configured")]
    MissingPath { node_id: NodeId },

    #[error("Node {node_id} failed to load '{}': {reason}", .path.display())]
    LoadFailed {
        node_id: NodeId,
        path: PathBuf,
        reason: String,
    },

    #[error("Node {node_id} failed to save '{}': {reason}", .path.display())]
    SaveFailed {
        node_id: NodeId,
        path: PathBuf,
        reason: String,
    },
}

impl ExecutionError {
    /// The node that raised this error.
    pub fn node_id(&self) -> NodeId {
        match self {
            ExecutionError::EmptyInput { node_id }
            | ExecutionError::MissingPath { node_id }
            | ExecutionError::LoadFailed { node_id, .. }
            | ExecutionError::SaveFailed { node_id, .. } => *node_id,
        }
    }

    /// Whether the node's output must be reset to empty when this error is
    /// absorbed.
    ///
    /// A failed save still leaves the sink holding the image it tried to write.
    pub fn clears_output(&self) -> bool {
        !matches!(self, ExecutionError::SaveFailed { .. })
    }
}

/// Result type alias for Pixelflow operations.
pub type PixelflowResult<T> = Result<T, PixelflowError>;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for node processing.
pub type NodeResult<T> = Result<T, ExecutionError>;
