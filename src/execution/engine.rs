//! Execution engine implementation.
//!
//! One call to [`ExecutionEngine::execute`] is one pass: every node is
//! processed exactly once, after all of its inputs, in depth-first post-order.
//! Data errors raised by nodes (empty input, failed load or save) are absorbed
//! into the report and the pass continues. A cycle stops the pass.

use crate::core::context::ExecutionContext;
use crate::core::error::{ExecutionError, GraphError, GraphResult, NodeId};
use crate::core::io::{FsImageIo, ImageIo};
use crate::core::node::Category;
use crate::core::types::ImageValue;
use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::graph::structure::ProcessingGraph;
use crate::graph::topology::TopologyAnalyzer;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execution options.
#[derive(Clone)]
pub struct ExecutionOptions {
    /// Whether per-node durations are kept in the report.
    pub record_timings: bool,
    /// Progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("record_timings", &self.record_timings)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            record_timings: true,
            progress_callback: None,
        }
    }
}

impl ExecutionOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or drop per-node durations.
    pub fn with_timings(mut self, record: bool) -> Self {
        self.record_timings = record;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }
}

/// Execution statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    /// Total execution time.
    pub total_duration: Duration,
    /// Number of nodes processed.
    pub nodes_executed: usize,
    /// Per-node processing time, in processing order. Empty when timings
    /// are off.
    pub node_durations: Vec<(NodeId, Duration)>,
}

/// Outcome of a pass that completed without a cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    /// Nodes in the order they were processed.
    pub processed: Vec<NodeId>,
    /// Data errors absorbed during the pass.
    pub warnings: Vec<ExecutionError>,
    /// Execution statistics.
    pub stats: ExecutionStats,
}

impl ExecutionReport {
    /// Whether no node raised a data error.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Data errors raised by one node.
    pub fn warnings_for(&self, node_id: NodeId) -> impl Iterator<Item = &ExecutionError> {
        self.warnings.iter().filter(move |w| w.node_id() == node_id)
    }
}

/// The execution engine.
///
/// Owns the I/O collaborator that sources and sinks read and write through.
pub struct ExecutionEngine {
    io: Arc<dyn ImageIo>,
    options: ExecutionOptions,
}

impl ExecutionEngine {
    /// Create an engine backed by the filesystem.
    pub fn new() -> Self {
        Self {
            io: Arc::new(FsImageIo::new()),
            options: ExecutionOptions::default(),
        }
    }

    /// Replace the I/O collaborator.
    pub fn with_io(mut self, io: Arc<dyn ImageIo>) -> Self {
        self.io = io;
        self
    }

    /// Set options.
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Run one pass over `graph`, updating every node's output in place.
    ///
    /// Fails with [`GraphError::CycleDetected`] when the graph has a cycle,
    /// or [`GraphError::UnknownNode`] when an input slot dangles. Nodes
    /// processed before a cycle was found keep their new outputs.
    pub fn execute(&self, graph: &mut ProcessingGraph) -> GraphResult<ExecutionReport> {
        let start_time = Instant::now();
        let analyzer = TopologyAnalyzer::new(graph)?;

        let mut tracker = ProgressTracker::new(analyzer.node_count());
        if let Some(callback) = &self.options.progress_callback {
            tracker = tracker.with_callback(callback.clone());
        }
        tracker.start();
        log::info!("Executing graph with {} nodes", analyzer.node_count());

        let mut report = ExecutionReport::default();
        let walked = analyzer.walk(|node_id| {
            self.process_node(graph, node_id, &tracker, &mut report);
        });

        if let Err(error) = walked {
            if let GraphError::CycleDetected { path } = &error {
                tracker.cycle_detected(path.clone());
            }
            log::warn!(
                "Execution aborted after {} nodes: {}",
                report.processed.len(),
                error
            );
            return Err(error);
        }

        report.stats.total_duration = start_time.elapsed();
        tracker.complete();
        log::info!(
            "Processed {} nodes in {:?} ({} warnings)",
            report.stats.nodes_executed,
            report.stats.total_duration,
            report.warnings.len()
        );

        Ok(report)
    }

    fn process_node(
        &self,
        graph: &mut ProcessingGraph,
        node_id: NodeId,
        tracker: &ProgressTracker,
        report: &mut ExecutionReport,
    ) {
        // The analyzer snapshot guarantees both ids resolve.
        let Ok(node) = graph.get_node(node_id) else {
            return;
        };
        let input = match node.category() {
            Category::Source => None,
            Category::Transform | Category::Sink => node
                .input()
                .and_then(|upstream| graph.get_node(upstream).ok())
                .map(|upstream| upstream.output().clone()),
        };
        let name = node.display_name();
        tracker.node_started(node_id, name.clone());

        let node_start = Instant::now();
        let mut ctx = ExecutionContext::new(node_id, input, self.io.as_ref());
        let result = node.filter.process(&mut ctx);
        let produced = ctx.take_output();
        let elapsed = node_start.elapsed();

        let Ok(node) = graph.get_node_mut(node_id) else {
            return;
        };
        match result {
            Ok(()) => {
                if let Some(output) = produced {
                    node.set_output(output);
                }
            }
            Err(error) => {
                if error.clears_output() {
                    node.set_output(ImageValue::empty());
                } else if let Some(output) = produced {
                    node.set_output(output);
                }
                log::warn!("{}", error);
                tracker.node_warning(node_id, error.to_string());
                report.warnings.push(error);
            }
        }

        log::debug!("Processed {} ({}) in {:?}", node_id, name, elapsed);
        report.processed.push(node_id);
        report.stats.nodes_executed += 1;
        if self.options.record_timings {
            report.stats.node_durations.push((node_id, elapsed));
        }
        tracker.node_completed(node_id, elapsed.as_millis() as u64);
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
