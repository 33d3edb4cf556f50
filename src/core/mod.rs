//! Core types and traits for the Pixelflow processing graph.
//!
//! This module contains:
//! - The image value carried along edges
//! - Parameter definitions and range clamping
//! - The `FilterNode` trait and node metadata
//! - The execution context and image I/O collaborators
//! - Error types

pub mod types;
pub mod port;
pub mod error;
pub mod context;
pub mod io;
pub mod node;

// Re-export commonly used types
pub use types::{ImageMetadata, ImageValue, Params};
pub use port::ParameterDefinition;
pub use error::{ExecutionError, GraphError, NodeId, PixelflowError};
pub use context::ExecutionContext;
pub use io::{FsImageIo, ImageIo, MemoryImageIo};
pub use node::{Category, FilterNode, NodeKind, NodeMetadata};
