//! Image I/O nodes: LoadImage, SaveImage, Preview

use crate::core::context::ExecutionContext;
use crate::core::error::{ExecutionError, NodeResult};
use crate::core::node::{Category, FilterNode, NodeMetadata};
use crate::filters::registry::FilterRegistry;
use std::path::{Path, PathBuf};

/// Register I/O nodes.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(LoadImage::default()));
    registry.register(|| Box::new(SaveImage::default()));
    registry.register(|| Box::new(Preview));
}

/// An empty path string counts as no path.
fn normalize(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Loads an image through the engine's I/O collaborator.
#[derive(Debug, Clone, Default)]
pub struct LoadImage {
    path: Option<PathBuf>,
}

impl LoadImage {
    /// A source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: normalize(path.into()),
        }
    }
}

impl FilterNode for LoadImage {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("load_image", "Load Image")
            .description("Load an image from a file path")
            .category(Category::Source)
            .takes_path()
            .tags(["input", "file"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        // Sources ignore their input slot.
        let node_id = ctx.node_id;
        let path = self
            .path
            .as_deref()
            .ok_or(ExecutionError::MissingPath { node_id })?;

        let image = ctx.io().load(path).map_err(|e| ExecutionError::LoadFailed {
            node_id,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        log::debug!(
            "Node {} loaded '{}' ({}x{})",
            node_id,
            path.display(),
            image.width(),
            image.height()
        );
        ctx.set_output_image(image);
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn set_path(&mut self, path: PathBuf) -> bool {
        self.path = normalize(path);
        true
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(self.clone())
    }
}

/// Passes the upstream image through and, when a path is set, writes it out.
fn pass_through(ctx: &mut ExecutionContext<'_>, path: Option<&Path>) -> NodeResult<()> {
    let node_id = ctx.node_id;
    let Some(input) = ctx.input().cloned() else {
        return Ok(());
    };
    let Some(image) = input.get_image() else {
        return Err(ExecutionError::EmptyInput { node_id });
    };

    ctx.set_output(input.clone());

    if let Some(path) = path {
        ctx.io()
            .save(path, image)
            .map_err(|e| ExecutionError::SaveFailed {
                node_id,
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        log::info!("Node {} wrote '{}'", node_id, path.display());
    }
    Ok(())
}

/// Saves the upstream image to disk.
///
/// The output is the input image itself, so downstream viewers see exactly
/// what was written.
#[derive(Debug, Clone, Default)]
pub struct SaveImage {
    path: Option<PathBuf>,
}

impl SaveImage {
    /// A sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: normalize(path.into()),
        }
    }
}

impl FilterNode for SaveImage {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("save_image", "Save Image")
            .description("Save an image to a file; the format follows the extension")
            .category(Category::Sink)
            .takes_path()
            .tags(["output", "file"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        pass_through(ctx, self.path.as_deref())
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn set_path(&mut self, path: PathBuf) -> bool {
        self.path = normalize(path);
        true
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(self.clone())
    }
}

/// Holds the upstream image for display without writing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preview;

impl FilterNode for Preview {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("preview", "Preview")
            .description("Hold the incoming image for display")
            .category(Category::Sink)
            .tags(["output", "view"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        pass_through(ctx, None)
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NodeId;
    use crate::core::io::MemoryImageIo;
    use crate::core::types::ImageValue;
    use image::DynamicImage;

    #[test]
    fn test_load_image() {
        let io = MemoryImageIo::new();
        io.insert("in.png", DynamicImage::new_rgb8(4, 3));

        let node = LoadImage::new("in.png");
        let mut ctx = ExecutionContext::new(NodeId(1), None, &io);
        node.process(&mut ctx).unwrap();

        let out = ctx.take_output().unwrap();
        assert_eq!(out.metadata().unwrap().width, 4);
        assert_eq!(io.loads(), vec![PathBuf::from("in.png")]);
    }

    #[test]
    fn test_load_missing_file() {
        let io = MemoryImageIo::new();
        let node = LoadImage::new("nope.png");
        let mut ctx = ExecutionContext::new(NodeId(2), None, &io);

        let err = node.process(&mut ctx).unwrap_err();
        assert!(matches!(err, ExecutionError::LoadFailed { node_id: NodeId(2), .. }));
        assert!(err.clears_output());
        assert!(ctx.take_output().is_none());
    }

    #[test]
    fn test_load_without_path() {
        let io = MemoryImageIo::new();
        let mut node = LoadImage::default();
        assert!(node.path().is_none());

        let mut ctx = ExecutionContext::new(NodeId(3), None, &io);
        assert_eq!(
            node.process(&mut ctx).unwrap_err(),
            ExecutionError::MissingPath { node_id: NodeId(3) }
        );

        assert!(node.set_path(PathBuf::new()));
        assert!(node.path().is_none());
    }

    #[test]
    fn test_save_shares_input() {
        let io = MemoryImageIo::new();
        let input = ImageValue::new(DynamicImage::new_luma8(2, 2));
        let node = SaveImage::new("out.png");

        let mut ctx = ExecutionContext::new(NodeId(4), Some(input.clone()), &io);
        node.process(&mut ctx).unwrap();

        assert!(ctx.take_output().unwrap().shares_buffer_with(&input));
        assert_eq!(io.saves(), vec![PathBuf::from("out.png")]);
        assert!(io.get("out.png").is_some());
    }

    #[test]
    fn test_save_empty_input_writes_nothing() {
        let io = MemoryImageIo::new();
        let node = SaveImage::new("out.png");

        let mut ctx = ExecutionContext::new(NodeId(5), Some(ImageValue::empty()), &io);
        let err = node.process(&mut ctx).unwrap_err();

        assert_eq!(err, ExecutionError::EmptyInput { node_id: NodeId(5) });
        assert!(io.saves().is_empty());
        assert!(ctx.take_output().is_none());
    }

    #[test]
    fn test_unconnected_sink_is_noop() {
        let io = MemoryImageIo::new();
        let mut ctx = ExecutionContext::new(NodeId(6), None, &io);
        SaveImage::new("out.png").process(&mut ctx).unwrap();
        assert!(ctx.take_output().is_none());
        assert!(io.saves().is_empty());
    }

    #[test]
    fn test_preview_never_writes() {
        let io = MemoryImageIo::new();
        let input = ImageValue::new(DynamicImage::new_rgba8(1, 1));
        let mut ctx = ExecutionContext::new(NodeId(7), Some(input), &io);

        Preview.process(&mut ctx).unwrap();
        assert!(ctx.take_output().is_some());
        assert!(io.saves().is_empty());
        assert_eq!(Preview.metadata().category, Category::Sink);
    }
}
