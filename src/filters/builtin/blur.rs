//! Box blur

use crate::core::context::ExecutionContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, FilterNode, NodeMetadata};
use crate::core::port::ParameterDefinition;
use crate::core::types::Params;
use crate::filters::registry::FilterRegistry;
use image::DynamicImage;
use imageproc::filter::separable_filter;

/// Register blur nodes.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(BoxBlur::default()));
}

const MIN_RADIUS: f64 = 1.0;
const MAX_RADIUS: f64 = 20.0;

/// Side length of the averaging kernel for `radius`: `2 * floor(r) + 1`,
/// with `r` clamped to `[1, 20]`.
pub fn kernel_size(radius: f64) -> u32 {
    let radius = if radius.is_finite() {
        radius.clamp(MIN_RADIUS, MAX_RADIUS)
    } else {
        MIN_RADIUS
    };
    2 * radius.floor() as u32 + 1
}

/// Averages each pixel over a square window.
///
/// Borders replicate the edge pixel. 8-bit gray and RGB layouts keep their
/// color type; anything else is blurred as RGBA8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBlur {
    radius: f64,
}

impl BoxBlur {
    fn radius_param() -> ParameterDefinition {
        ParameterDefinition::new("radius", 1.0, MIN_RADIUS, MAX_RADIUS)
            .with_description("Half-width of the window; the fractional part is dropped")
    }

    /// Create with an explicit radius, clamped into range.
    pub fn new(radius: f64) -> Self {
        Self {
            radius: Self::radius_param().clamp(radius),
        }
    }

    /// Blur a whole image.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let side = kernel_size(self.radius) as usize;
        let kernel = vec![1.0 / side as f32; side];

        match image {
            DynamicImage::ImageLuma8(buffer) => {
                DynamicImage::ImageLuma8(separable_filter(buffer, &kernel, &kernel))
            }
            DynamicImage::ImageLumaA8(buffer) => {
                DynamicImage::ImageLumaA8(separable_filter(buffer, &kernel, &kernel))
            }
            DynamicImage::ImageRgb8(buffer) => {
                DynamicImage::ImageRgb8(separable_filter(buffer, &kernel, &kernel))
            }
            DynamicImage::ImageRgba8(buffer) => {
                DynamicImage::ImageRgba8(separable_filter(buffer, &kernel, &kernel))
            }
            other => {
                let rgba = other.to_rgba8();
                DynamicImage::ImageRgba8(separable_filter(&rgba, &kernel, &kernel))
            }
        }
    }
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self { radius: MIN_RADIUS }
    }
}

impl FilterNode for BoxBlur {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("box_blur", "Box Blur")
            .description("Average each pixel over a (2r+1) x (2r+1) window")
            .category(Category::Transform)
            .parameter(Self::radius_param())
            .tags(["blur", "smooth"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        let Some(image) = ctx.input_image()? else {
            return Ok(());
        };
        let result = self.apply(image);
        ctx.set_output_image(result);
        Ok(())
    }

    fn set_params(&mut self, params: &Params) {
        Self::radius_param().merge_into(params, &mut self.radius);
    }

    fn params(&self) -> Params {
        Params::from([("radius".to_string(), self.radius)])
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::params;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_box_blur_metadata() {
        let metadata = BoxBlur::default().metadata();
        assert_eq!(metadata.id, "box_blur");
        assert_eq!(metadata.parameters.len(), 1);
    }

    #[test]
    fn test_kernel_size() {
        assert_eq!(kernel_size(3.4), 7);
        assert_eq!(kernel_size(1.0), 3);
        assert_eq!(kernel_size(0.2), 3);
        assert_eq!(kernel_size(20.9), 41);
        assert_eq!(kernel_size(100.0), 41);
        assert_eq!(kernel_size(f64::NAN), 3);
    }

    #[test]
    fn test_nan_radius_uses_default() {
        assert_eq!(BoxBlur::new(f64::NAN).params()["radius"], 1.0);
    }

    #[test]
    fn test_radius_clamped() {
        let mut blur = BoxBlur::new(0.0);
        assert_eq!(blur.params()["radius"], 1.0);
        blur.set_params(&params([("radius", 64.0)]));
        assert_eq!(blur.params()["radius"], 20.0);
    }

    #[test]
    fn test_impulse_spread_matches_kernel() {
        // A single bright pixel spreads exactly `floor(radius)` pixels each way.
        let mut input = GrayImage::new(21, 21);
        input.put_pixel(10, 10, Luma([255]));

        let DynamicImage::ImageLuma8(out) =
            BoxBlur::new(3.4).apply(&DynamicImage::ImageLuma8(input))
        else {
            panic!("expected Luma8");
        };

        assert!(out.get_pixel(13, 10).0[0] > 0);
        assert!(out.get_pixel(10, 7).0[0] > 0);
        assert_eq!(out.get_pixel(14, 10).0[0], 0);
        assert_eq!(out.get_pixel(10, 6).0[0], 0);
    }

    #[test]
    fn test_uniform_image_unchanged() {
        for radius in [1.0, 2.0, 3.0, 5.0] {
            for value in [40u8, 100, 200, 255] {
                let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([value; 3])));
                let out = BoxBlur::new(radius).apply(&input);
                assert_eq!(out, input, "radius {} value {}", radius, value);
            }
        }
    }
}
