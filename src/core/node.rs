//! FilterNode trait and node metadata.
//!
//! Every node kind implements [`FilterNode`]. A kind owns its own parameter
//! struct, exposes it as a numeric [`Params`] map for the UI, and computes its
//! output from the single upstream image handed over in the
//! [`ExecutionContext`].

use crate::core::context::ExecutionContext;
use crate::core::error::NodeResult;
use crate::core::port::ParameterDefinition;
use crate::core::types::Params;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The three node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Produces an image from nothing (reads an external resource).
    Source,
    /// Consumes one image and produces one image.
    Transform,
    /// Consumes one image, optionally writes it out, passes it through.
    Sink,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Source => "Source",
            Category::Transform => "Transform",
            Category::Sink => "Sink",
        }
    }

    /// Get all categories in display order.
    pub fn all() -> &'static [Category] {
        &[Category::Source, Category::Transform, Category::Sink]
    }

    /// Number of upstream inputs a node of this category consumes.
    pub fn input_arity(&self) -> usize {
        match self {
            Category::Source => 0,
            Category::Transform | Category::Sink => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Tag identifying a node's variant and operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKind {
    /// Variant
    pub category: Category,
    /// Operation tag, e.g. `"brightness_contrast"`
    pub operation: String,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.operation)
    }
}

/// Metadata describing a filter node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Unique tag for this filter type (e.g., "box_blur")
    pub id: String,
    /// Human-readable name (e.g., "Box Blur")
    pub name: String,
    /// Variant
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Parameter definitions
    pub parameters: Vec<ParameterDefinition>,
    /// Whether the node is configured with a file path
    pub takes_path: bool,
    /// Searchable tags
    pub tags: Vec<String>,
}

impl NodeMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NodeMetadataBuilder {
        NodeMetadataBuilder::new(id, name)
    }

    /// The node kind this metadata describes.
    pub fn kind(&self) -> NodeKind {
        NodeKind {
            category: self.category,
            operation: self.id.clone(),
        }
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Default values of every parameter.
    pub fn default_params(&self) -> Params {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_value))
            .collect()
    }
}

/// Builder for NodeMetadata.
pub struct NodeMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    parameters: Vec<ParameterDefinition>,
    takes_path: bool,
    tags: Vec<String>,
}

impl NodeMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Transform,
            description: String::new(),
            parameters: Vec::new(),
            takes_path: false,
            tags: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Mark the node as configured with a file path.
    pub fn takes_path(mut self) -> Self {
        self.takes_path = true;
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Build the metadata.
    pub fn build(self) -> NodeMetadata {
        NodeMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            parameters: self.parameters,
            takes_path: self.takes_path,
            tags: self.tags,
        }
    }
}

/// The core trait for filter nodes.
///
/// # Contract
///
/// - `process` reads the upstream image from the context and sets an output.
///   Leaving the output unset keeps the node's previous output; this is what a
///   transform does when its slot is unconnected.
/// - Returning an [`ExecutionError`](crate::core::error::ExecutionError) never
///   aborts the pass. The engine records it and, when
///   [`clears_output`](crate::core::error::ExecutionError::clears_output)
///   says so, resets the node's output to empty.
/// - `process` must be idempotent for unchanged input and parameters.
/// - `set_params` merges: absent keys keep their value, unknown keys are
///   ignored, out-of-range values are clamped.
pub trait FilterNode: Send + Sync {
    /// Get the metadata for this filter.
    fn metadata(&self) -> NodeMetadata;

    /// Compute the output.
    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()>;

    /// Merge numeric parameters.
    fn set_params(&mut self, _params: &Params) {}

    /// Current numeric parameters.
    fn params(&self) -> Params {
        Params::new()
    }

    /// Configured file path, for nodes that take one.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Configure the file path. Returns `false` if this kind has none.
    fn set_path(&mut self, _path: PathBuf) -> bool {
        false
    }

    /// Clone this node into a boxed trait object.
    fn clone_box(&self) -> Box<dyn FilterNode>;
}

// Allow cloning Box<dyn FilterNode>
impl Clone for Box<dyn FilterNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let metadata = NodeMetadata::builder("test_filter", "Test Filter")
            .category(Category::Sink)
            .description("A test filter")
            .parameter(ParameterDefinition::new("amount", 1.0, 0.0, 2.0))
            .takes_path()
            .tags(["test", "debug"])
            .build();

        assert_eq!(metadata.id, "test_filter");
        assert_eq!(metadata.name, "Test Filter");
        assert_eq!(metadata.category, Category::Sink);
        assert!(metadata.takes_path);
        assert_eq!(metadata.tags.len(), 2);
        assert_eq!(metadata.default_params().get("amount"), Some(&1.0));
        assert!(metadata.get_parameter("missing").is_none());
    }

    #[test]
    fn test_kind_display() {
        let kind = NodeMetadata::builder("box_blur", "Box Blur").build().kind();
        assert_eq!(kind.to_string(), "Transform:box_blur");
    }

    #[test]
    fn test_category_arity() {
        assert_eq!(Category::Source.input_arity(), 0);
        assert_eq!(Category::Transform.input_arity(), 1);
        assert_eq!(Category::Sink.input_arity(), 1);
        assert_eq!(Category::all().len(), 3);
    }
}
