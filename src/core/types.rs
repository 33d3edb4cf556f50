//! Value types that flow along the edges of the graph.
//!
//! Every edge carries a single [`ImageValue`]. The pixel data sits behind an
//! `Arc` so a downstream node can read its upstream's output through a cheap
//! read-only handle without taking ownership of it.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Numeric parameter mapping supplied by the parameter UI.
pub type Params = HashMap<String, f64>;

/// Build a [`Params`] map from `(name, value)` pairs.
pub fn params<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Params {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Image metadata without the pixel data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of channels per pixel
    pub channels: u8,
    /// Whether the image has an alpha channel
    pub has_alpha: bool,
}

impl ImageMetadata {
    /// Describe an image.
    pub fn of(image: &DynamicImage) -> Self {
        let color = image.color();
        Self {
            width: image.width(),
            height: image.height(),
            channels: color.channel_count(),
            has_alpha: color.has_alpha(),
        }
    }
}

/// A node output: either an image or empty.
///
/// Empty is the state before a node's first execution and the state a node
/// falls back to when its input was empty or its source could not be read.
#[derive(Debug, Clone, Default)]
pub struct ImageValue {
    data: Option<Arc<DynamicImage>>,
}

impl ImageValue {
    /// Wrap an image.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            data: Some(Arc::new(image)),
        }
    }

    /// The empty value.
    pub fn empty() -> Self {
        Self { data: None }
    }

    /// Whether this value holds no image.
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Borrow the image, if any.
    pub fn get_image(&self) -> Option<&DynamicImage> {
        self.data.as_deref()
    }

    /// Metadata of the held image, if any.
    pub fn metadata(&self) -> Option<ImageMetadata> {
        self.get_image().map(ImageMetadata::of)
    }

    /// Whether two values share the same underlying buffer.
    pub fn shares_buffer_with(&self, other: &ImageValue) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<DynamicImage> for ImageValue {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
