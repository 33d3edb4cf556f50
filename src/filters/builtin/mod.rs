//! Built-in node kinds.
//!
//! This module contains the nodes that ship with Pixelflow.

mod io;
mod blur;
mod color;
mod edge;

use crate::filters::registry::FilterRegistry;

/// Register all built-in nodes.
pub fn register_all(registry: &mut FilterRegistry) {
    io::register(registry);
    color::register(registry);
    blur::register(registry);
    edge::register(registry);
}

// Re-export for direct access
pub use io::{LoadImage, Preview, SaveImage};
pub use blur::{kernel_size, BoxBlur};
pub use color::{BrightnessContrast, ChannelExtract, Threshold};
pub use edge::EdgeDetect;
