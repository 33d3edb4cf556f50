//! Execution engine module.
//!
//! This module runs processing graphs: one depth-first pass per call.

pub mod engine;
pub mod progress;

pub use engine::{ExecutionEngine, ExecutionOptions, ExecutionReport, ExecutionStats};
pub use progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
