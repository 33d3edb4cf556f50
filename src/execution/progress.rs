//! Progress reporting for an execution pass.

use crate::core::error::NodeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// The pass has started.
    Started {
        total_nodes: usize,
    },
    /// A node is about to process. `index` counts nodes already processed.
    NodeStarted {
        node_id: NodeId,
        node_name: String,
        index: usize,
    },
    /// A node has finished processing.
    NodeCompleted {
        node_id: NodeId,
        duration_ms: u64,
    },
    /// A node absorbed a data error.
    NodeWarning {
        node_id: NodeId,
        message: String,
    },
    /// The pass stopped on a cycle.
    CycleDetected {
        path: Vec<NodeId>,
    },
    /// The pass finished without a structural error.
    Completed {
        total_duration_ms: u64,
        nodes_processed: usize,
        warnings: usize,
    },
}

/// Callback type for progress updates.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Tracks one execution pass and forwards events to an optional callback.
pub struct ProgressTracker {
    /// Number of nodes in the graph.
    total_nodes: usize,
    /// Number of nodes completed.
    completed_nodes: AtomicUsize,
    /// Number of absorbed data errors.
    warnings: AtomicUsize,
    /// Start time.
    start_time: Option<Instant>,
    /// Progress callback.
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new(total_nodes: usize) -> Self {
        Self {
            total_nodes,
            completed_nodes: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
            start_time: None,
            callback: None,
        }
    }

    /// Set a callback for progress updates.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start tracking.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.send_update(ProgressUpdate::Started {
            total_nodes: self.total_nodes,
        });
    }

    /// Report that a node has started.
    pub fn node_started(&self, node_id: NodeId, node_name: String) {
        self.send_update(ProgressUpdate::NodeStarted {
            node_id,
            node_name,
            index: self.completed_nodes.load(Ordering::Relaxed),
        });
    }

    /// Report that a node has completed.
    pub fn node_completed(&self, node_id: NodeId, duration_ms: u64) {
        self.completed_nodes.fetch_add(1, Ordering::Relaxed);
        self.send_update(ProgressUpdate::NodeCompleted {
            node_id,
            duration_ms,
        });
    }

    /// Report an absorbed data error.
    pub fn node_warning(&self, node_id: NodeId, message: String) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        self.send_update(ProgressUpdate::NodeWarning { node_id, message });
    }

    /// Report the cycle that stopped the pass.
    pub fn cycle_detected(&self, path: Vec<NodeId>) {
        self.send_update(ProgressUpdate::CycleDetected { path });
    }

    /// Complete tracking.
    pub fn complete(&self) {
        self.send_update(ProgressUpdate::Completed {
            total_duration_ms: self.elapsed_ms(),
            nodes_processed: self.completed_nodes.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
        });
    }

    /// Milliseconds since [`start`](Self::start), zero before it.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Get current progress percentage.
    pub fn progress_percent(&self) -> f32 {
        if self.total_nodes == 0 {
            return 100.0;
        }
        let completed = self.completed_nodes.load(Ordering::Relaxed);
        (completed as f32 / self.total_nodes as f32) * 100.0
    }

    fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}
