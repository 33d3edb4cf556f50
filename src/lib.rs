//! # Pixelflow - Node-graph Image Processing
//!
//! Pixelflow evaluates directed graphs of image operations. Each node is a
//! Source (reads an image), a Transform (one image in, one image out) or a
//! Sink (writes or displays its input). Every node has at most one input
//! slot; several nodes may read the same upstream output.
//!
//! ## Features
//!
//! - **Depth-first execution**: one pass processes every node exactly once,
//!   after all of its inputs, using an explicit stack
//! - **Cycle detection**: back edges stop the pass with the offending path
//! - **Non-fatal data errors**: an empty input or a failed load empties the
//!   node's output and flows downstream instead of aborting
//! - **Extensible**: add node kinds through the [`FilterNode`](core::FilterNode)
//!   trait and the [`FilterRegistry`](filters::FilterRegistry)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixelflow::prelude::*;
//!
//! let registry = FilterRegistry::with_builtins();
//! let mut graph = ProcessingGraph::new();
//!
//! let load = graph.add_filter(registry.create_node("load_image").unwrap());
//! graph.set_path(load, "input.png").unwrap();
//!
//! let adjust = graph.add_filter(registry.create_node("brightness_contrast").unwrap());
//! graph.set_params(adjust, &params([("brightness", 20.0), ("contrast", 1.2)])).unwrap();
//!
//! let save = graph.add_filter(registry.create_node("save_image").unwrap());
//! graph.set_path(save, "output.png").unwrap();
//!
//! graph.connect(load, adjust).unwrap();
//! graph.connect(adjust, save).unwrap();
//!
//! let report = ExecutionEngine::new().execute(&mut graph).unwrap();
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: image values, node trait, contexts, I/O and errors
//! - [`graph`]: graph structure and topology analysis
//! - [`execution`]: execution engine and progress reporting
//! - [`filters`]: node registry and built-in node kinds
//! - [`config`]: TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod execution;
pub mod filters;
pub mod graph;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pixelflow::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{params, ImageMetadata, ImageValue, Params};

    // Node traits and types
    pub use crate::core::node::{Category, FilterNode, NodeKind, NodeMetadata};

    // Parameters
    pub use crate::core::port::{ParameterDefinition, UiHint};

    // Context and I/O
    pub use crate::core::context::ExecutionContext;
    pub use crate::core::io::{FsImageIo, ImageIo, MemoryImageIo};

    // Errors
    pub use crate::core::error::{
        ExecutionError, GraphError, GraphResult, NodeId, NodeResult, PixelflowError,
        PixelflowResult,
    };

    // Graph
    pub use crate::graph::connection::Connection;
    pub use crate::graph::structure::{GraphNode, ProcessingGraph};
    pub use crate::graph::topology::{TopologyAnalyzer, VisitState};

    // Execution
    pub use crate::execution::engine::{
        ExecutionEngine, ExecutionOptions, ExecutionReport, ExecutionStats,
    };
    pub use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};

    // Filters
    pub use crate::filters::registry::{FilterFactory, FilterRegistry, RegistryBuilder};

    // Built-in nodes
    pub use crate::filters::builtin::{
        kernel_size, BoxBlur, BrightnessContrast, ChannelExtract, EdgeDetect, LoadImage, Preview,
        SaveImage, Threshold,
    };

    // Configuration
    pub use crate::config::Config;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
