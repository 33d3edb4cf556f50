//! Filter module.
//!
//! Contains the node registry and the built-in node kinds.

pub mod registry;
pub mod builtin;

pub use registry::{FilterFactory, FilterRegistry};
