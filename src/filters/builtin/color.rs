//! Per-pixel color operations: brightness/contrast, threshold, channel extract

use crate::core::context::ExecutionContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, FilterNode, NodeMetadata};
use crate::core::port::{ParameterDefinition, UiHint};
use crate::core::types::Params;
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel};

/// Register color nodes.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(BrightnessContrast::default()));
    registry.register(|| Box::new(Threshold::default()));
    registry.register(|| Box::new(ChannelExtract::default()));
}

/// Apply `f` to every color channel of an 8-bit image, leaving alpha alone.
///
/// 8-bit gray and RGB layouts keep their color type; anything else is
/// converted to RGBA8 first.
fn map_color_channels<F>(image: &DynamicImage, f: F) -> DynamicImage
where
    F: Fn(u8) -> u8,
{
    fn apply<P, F>(buffer: &ImageBuffer<P, Vec<u8>>, f: &F) -> ImageBuffer<P, Vec<u8>>
    where
        P: Pixel<Subpixel = u8>,
        F: Fn(u8) -> u8,
    {
        let mut out = buffer.clone();
        for pixel in out.pixels_mut() {
            pixel.apply_without_alpha(|c| f(c));
        }
        out
    }

    match image {
        DynamicImage::ImageLuma8(buffer) => DynamicImage::ImageLuma8(apply(buffer, &f)),
        DynamicImage::ImageLumaA8(buffer) => DynamicImage::ImageLumaA8(apply(buffer, &f)),
        DynamicImage::ImageRgb8(buffer) => DynamicImage::ImageRgb8(apply(buffer, &f)),
        DynamicImage::ImageRgba8(buffer) => DynamicImage::ImageRgba8(apply(buffer, &f)),
        other => DynamicImage::ImageRgba8(apply(&other.to_rgba8(), &f)),
    }
}

// ============================================================================
// Brightness / Contrast
// ============================================================================

/// Linear intensity adjustment: `out = in * contrast + brightness`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessContrast {
    brightness: f64,
    contrast: f64,
}

impl BrightnessContrast {
    fn brightness_param() -> ParameterDefinition {
        ParameterDefinition::new("brightness", 0.0, -100.0, 100.0)
            .with_description("Offset added to every channel")
    }

    fn contrast_param() -> ParameterDefinition {
        ParameterDefinition::new("contrast", 1.0, 0.0, 3.0)
            .with_description("Gain applied to every channel")
    }

    /// Create with explicit values, clamped into range.
    pub fn new(brightness: f64, contrast: f64) -> Self {
        Self {
            brightness: Self::brightness_param().clamp(brightness),
            contrast: Self::contrast_param().clamp(contrast),
        }
    }

    /// Adjust one channel value, rounding and saturating to `[0, 255]`.
    pub fn adjust(&self, value: u8) -> u8 {
        (value as f64 * self.contrast + self.brightness)
            .round()
            .clamp(0.0, 255.0) as u8
    }

    /// Apply the adjustment to a whole image.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        map_color_channels(image, |v| self.adjust(v))
    }
}

impl Default for BrightnessContrast {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

impl FilterNode for BrightnessContrast {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("brightness_contrast", "Brightness / Contrast")
            .description("Scale by contrast and add brightness, saturating at the intensity bounds")
            .category(Category::Transform)
            .parameter(Self::brightness_param())
            .parameter(Self::contrast_param())
            .tags(["color", "levels"])
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
        Self::brightness_param().merge_into(params, &mut self.brightness);
        Self::contrast_param().merge_into(params, &mut self.contrast);
    }

    fn params(&self) -> Params {
        Params::from([
            ("brightness".to_string(), self.brightness),
            ("contrast".to_string(), self.contrast),
        ])
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

// ============================================================================
// Threshold
// ============================================================================

/// Binarizes the grayscale image: above the threshold is white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    threshold: f64,
}

impl Threshold {
    fn threshold_param() -> ParameterDefinition {
        ParameterDefinition::new("threshold", 128.0, 0.0, 255.0)
            .with_description("Gray values strictly above this become 255")
            .with_ui_hint(UiHint::SpinBox)
    }

    /// Create with an explicit threshold, clamped into range.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: Self::threshold_param().clamp(threshold),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self { threshold: 128.0 }
    }
}

impl FilterNode for Threshold {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("threshold", "Threshold")
            .description("Convert to a black and white image")
            .category(Category::Transform)
            .parameter(Self::threshold_param())
            .tags(["binary", "mask"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        let Some(image) = ctx.input_image()? else {
            return Ok(());
        };
        let mut gray = image.to_luma8();
        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] as f64 > self.threshold { 255 } else { 0 };
        }
        ctx.set_output_image(DynamicImage::ImageLuma8(gray));
        Ok(())
    }

    fn set_params(&mut self, params: &Params) {
        Self::threshold_param().merge_into(params, &mut self.threshold);
    }

    fn params(&self) -> Params {
        Params::from([("threshold".to_string(), self.threshold)])
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

// ============================================================================
// Channel Extract
// ============================================================================

/// Pulls one channel (R, G, B or A) out as a grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelExtract {
    channel: f64,
}

impl ChannelExtract {
    fn channel_param() -> ParameterDefinition {
        ParameterDefinition::new("channel", 0.0, 0.0, 3.0)
            .with_description("0 = red, 1 = green, 2 = blue, 3 = alpha")
            .with_ui_hint(UiHint::SpinBox)
    }

    /// Create for a channel index, clamped to `[0, 3]`.
    pub fn new(channel: u8) -> Self {
        Self {
            channel: Self::channel_param().clamp(channel as f64),
        }
    }

    fn index(&self) -> usize {
        self.channel.floor() as usize
    }

    /// Extract the configured channel.
    ///
    /// Asking for alpha on an image without one yields a black image.
    pub fn apply(&self, image: &DynamicImage) -> GrayImage {
        let index = self.index();
        if index == 3 && !image.color().has_alpha() {
            return GrayImage::new(image.width(), image.height());
        }
        let rgba = image.to_rgba8();
        GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            Luma([rgba.get_pixel(x, y).0[index]])
        })
    }
}

impl FilterNode for ChannelExtract {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder("channel_extract", "Channel Extract")
            .description("Extract a single color channel as a grayscale image")
            .category(Category::Transform)
            .parameter(Self::channel_param())
            .tags(["channel", "split"])
            .build()
    }

    fn process(&self, ctx: &mut ExecutionContext<'_>) -> NodeResult<()> {
        let Some(image) = ctx.input_image()? else {
            return Ok(());
        };
        let result = self.apply(image);
        ctx.set_output_image(DynamicImage::ImageLuma8(result));
        Ok(())
    }

    fn set_params(&mut self, params: &Params) {
        Self::channel_param().merge_into(params, &mut self.channel);
    }

    fn params(&self) -> Params {
        Params::from([("channel".to_string(), self.channel)])
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ExecutionError, NodeId};
    use crate::core::io::MemoryImageIo;
    use crate::core::types::{params, ImageValue};
    use image::{GenericImageView, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn run(node: &dyn FilterNode, input: DynamicImage) -> DynamicImage {
        let io = MemoryImageIo::new();
        let mut ctx = ExecutionContext::new(NodeId(1), Some(ImageValue::new(input)), &io);
        node.process(&mut ctx).unwrap();
        let out = ctx.take_output().unwrap();
        out.get_image().unwrap().clone()
    }

    #[test]
    fn test_brightness_contrast_metadata() {
        let metadata = BrightnessContrast::default().metadata();
        assert_eq!(metadata.id, "brightness_contrast");
        assert_eq!(metadata.category, Category::Transform);
        assert_eq!(metadata.parameters.len(), 2);
        assert_eq!(
            metadata.default_params(),
            params([("brightness", 0.0), ("contrast", 1.0)])
        );
    }

    #[test]
    fn test_identity_law() {
        let input = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 7) as u8])
        }));
        let out = run(&BrightnessContrast::default(), input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn test_pixel_law() {
        let bc = BrightnessContrast::new(50.0, 1.5);
        assert_eq!(bc.adjust(0), 50);
        assert_eq!(bc.adjust(100), 200);
        assert_eq!(bc.adjust(3), 55); // 54.5 rounds up
        assert_eq!(bc.adjust(200), 255);
    }

    #[test]
    fn test_clamping_at_bounds() {
        assert_eq!(BrightnessContrast::new(100.0, 1.0).adjust(250), 255);
        assert_eq!(BrightnessContrast::new(-100.0, 1.0).adjust(30), 0);

        // Once a value saturates the lost range does not come back.
        let down = BrightnessContrast::new(-100.0, 1.0);
        let up = BrightnessContrast::new(100.0, 1.0);
        assert_eq!(up.adjust(down.adjust(50)), 100);
    }

    #[test]
    fn test_alpha_untouched() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 77])));
        let out = run(&BrightnessContrast::new(10.0, 2.0), input);
        assert_eq!(out.get_pixel(0, 0), Rgba([30, 50, 70, 77]));
    }

    #[test]
    fn test_color_type_preserved() {
        let gray = DynamicImage::new_luma8(3, 3);
        assert!(matches!(
            run(&BrightnessContrast::new(5.0, 1.0), gray),
            DynamicImage::ImageLuma8(_)
        ));

        let gray_alpha = DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(1, 1, LumaA([100, 9])));
        let DynamicImage::ImageLumaA8(out) = run(&BrightnessContrast::new(5.0, 1.0), gray_alpha)
        else {
            panic!("expected LumaA8");
        };
        assert_eq!(out.get_pixel(0, 0).0, [105, 9]);
    }

    #[test]
    fn test_params_merge_and_clamp() {
        let mut bc = BrightnessContrast::default();
        bc.set_params(&params([("brightness", 500.0)]));
        assert_eq!(bc.params()["brightness"], 100.0);
        assert_eq!(bc.params()["contrast"], 1.0);

        bc.set_params(&params([("contrast", -1.0), ("unknown", 3.0)]));
        assert_eq!(bc.params()["contrast"], 0.0);

        bc.set_params(&params([("brightness", f64::NAN)]));
        assert_eq!(bc.params()["brightness"], 100.0);
    }

    #[test]
    fn test_empty_input_reports() {
        let io = MemoryImageIo::new();
        let mut ctx = ExecutionContext::new(NodeId(9), Some(ImageValue::empty()), &io);
        let err = BrightnessContrast::default().process(&mut ctx).unwrap_err();
        assert_eq!(err, ExecutionError::EmptyInput { node_id: NodeId(9) });
    }

    #[test]
    fn test_unconnected_transform_keeps_output() {
        let io = MemoryImageIo::new();
        let mut ctx = ExecutionContext::new(NodeId(9), None, &io);
        BrightnessContrast::default().process(&mut ctx).unwrap();
        assert!(ctx.take_output().is_none());
    }

    #[test]
    fn test_threshold() {
        let input = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 1, |x, _| {
            Luma([[127u8, 128, 129][x as usize]])
        }));
        let DynamicImage::ImageLuma8(out) = run(&Threshold::default(), input) else {
            panic!("expected Luma8");
        };
        assert_eq!(out.into_raw(), vec![0, 0, 255]);
    }

    #[test]
    fn test_threshold_clamps() {
        let mut node = Threshold::new(300.0);
        assert_eq!(node.params()["threshold"], 255.0);
        node.set_params(&params([("threshold", -4.0)]));
        assert_eq!(node.params()["threshold"], 0.0);
    }

    #[test]
    fn test_nan_constructor_uses_defaults() {
        let bc = BrightnessContrast::new(f64::NAN, f64::NAN);
        assert_eq!(bc.params(), params([("brightness", 0.0), ("contrast", 1.0)]));
        assert_eq!(bc.adjust(100), 100);

        assert_eq!(Threshold::new(f64::NAN).params()["threshold"], 128.0);
    }

    #[test]
    fn test_channel_extract() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 4])));
        for (channel, expected) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            let out = ChannelExtract::new(channel).apply(&input);
            assert_eq!(out.get_pixel(1, 0).0, [expected]);
        }
    }

    #[test]
    fn test_channel_extract_missing_alpha() {
        let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])));
        let out = ChannelExtract::new(3).apply(&input);
        assert!(out.pixels().all(|p| p.0[0] == 0));
        assert_eq!(out.dimensions(), (2, 2));
    }
}
