//! Edge detection

use crate::core::context::ExecutionContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, FilterNode, NodeMetadata};
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::gradients::sobel_gradients;

/// Register edge nodes.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(EdgeDetect));
}

/// Sobel gradient magnitude of the grayscale image, saturated to 8 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetect;

impl EdgeDetect {
    /// Compute the edge map.
    pub fn apply(&self, image: &DynamicImage) -> GrayImage {
        let gradients = sobel_gradients(&image.to_luma8());
        GrayImage::from_fn(gradients.width(), gradients.height(), |x, y| {
            let magnitude = gradients.get_pixel(x, y).0[0];
            Luma([magnitude.min(u8::MAX as u16) as u8])
        })
    }
}

impl FilterNode for EdgeDetect {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("edge_detect", "Edge Detect")
            .description("Highlight edges using the Sobel operator")
            .category(Category::Transform)
            .tags(["edges", "sobel", "gradient"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        let Some(image) = ctx.input_image()? else {
            return Ok(());
        };
        let edges = self.apply(image);
        ctx.set_output_image(DynamicImage::ImageLuma8(edges));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_image_has_no_edges() {
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([90])));
        let edges = EdgeDetect.apply(&flat);
        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_step_edge() {
        let step = DynamicImage::ImageLuma8(GrayImage::from_fn(8, 4, |x, _| {
            Luma([if x < 4 { 0 } else { 200 }])
        }));
        let edges = EdgeDetect.apply(&step);

        assert_eq!(edges.get_pixel(4, 2).0[0], 255);
        assert_eq!(edges.get_pixel(0, 2).0[0], 0);
        assert_eq!(edges.get_pixel(7, 2).0[0], 0);
    }

    #[test]
    fn test_metadata() {
        let metadata = EdgeDetect.metadata();
        assert_eq!(metadata.id, "edge_detect");
        assert!(metadata.parameters.is_empty());
    }
}
