//! Execution context handed to a node while it processes.
//!
//! The context carries what a node may look at (its upstream output and the
//! I/O collaborator) and collects what it produces. A node never sees the
//! graph, so it cannot reach another node's state.

use crate::core::error::{ExecutionError, NodeId, NodeResult};
use crate::core::io::ImageIo;
use crate::core::types::ImageValue;
use image::DynamicImage;

/// Context provided during node execution.
pub struct ExecutionContext<'a> {
    /// ID of the node being executed.
    pub node_id: NodeId,
    /// Upstream output, `None` when the input slot is unconnected.
    input: Option<ImageValue>,
    /// Output set by the node during this call.
    output: Option<ImageValue>,
    io: &'a dyn ImageIo,
}

impl<'a> ExecutionContext<'a> {
    /// Create a new execution context.
    pub fn new(node_id: NodeId, input: Option<ImageValue>, io: &'a dyn ImageIo) -> Self {
        Self {
            node_id,
            input,
            output: None,
            io,
        }
    }

    /// Whether an upstream node is connected.
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// The raw upstream value, `None` when unconnected.
    pub fn input(&self) -> Option<&ImageValue> {
        self.input.as_ref()
    }

    /// The upstream image.
    ///
    /// `Ok(None)` when the slot is unconnected. Fails with
    /// [`ExecutionError::EmptyInput`] when an upstream node is connected but
    /// its output is empty.
    pub fn input_image(&self) -> NodeResult<Option<&DynamicImage>> {
        match &self.input {
            None => Ok(None),
            Some(value) => value
                .get_image()
                .map(Some)
                .ok_or(ExecutionError::EmptyInput {
                    node_id: self.node_id,
                }),
        }
    }

    /// The I/O collaborator.
    pub fn io(&self) -> &dyn ImageIo {
        self.io
    }

    /// Set the output to a freshly computed image.
    pub fn set_output_image(&mut self, image: DynamicImage) {
        self.output = Some(ImageValue::new(image));
    }

    /// Set the output to an existing value, sharing its buffer.
    pub fn set_output(&mut self, value: ImageValue) {
        self.output = Some(value);
    }

    /// Take the output set during this call. `None` means the node left its
    /// previous output in place.
    pub fn take_output(&mut self) -> Option<ImageValue> {
        self.output.take()
    }
}
