//! Parameter definitions and range constraints.
//!
//! Every numeric node parameter is described by a [`ParameterDefinition`]
//! that carries its default and the range incoming values are clamped to.

use crate::core::types::Params;
use serde::{Deserialize, Serialize};

/// UI hints for parameter display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "widget")]
pub enum UiHint {
    /// Default numeric input
    Default,
    /// Slider for numeric values
    Slider {
        /// Whether to use logarithmic scale
        logarithmic: bool,
    },
    /// Spin box for integers
    SpinBox,
}

/// Definition of a numeric node parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDefinition {
    /// Unique name within the node
    pub name: String,
    /// Default value
    pub default_value: f64,
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
    /// Description for documentation
    pub description: String,
    /// UI widget hint
    pub ui_hint: UiHint,
}

impl ParameterDefinition {
    /// Create a parameter definition with range `[min, max]`.
    pub fn new(name: impl Into<String>, default_value: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            default_value,
            min,
            max,
            description: String::new(),
            ui_hint: UiHint::Slider { logarithmic: false },
        }
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the UI hint.
    pub fn with_ui_hint(mut self, hint: UiHint) -> Self {
        self.ui_hint = hint;
        self
    }

    /// Clamp a value into this parameter's range.
    ///
    /// Non-finite values fall back to the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default_value
        }
    }

    /// Merge this parameter from `params` into `slot`.
    ///
    /// Absent keys and non-finite values leave `slot` untouched. Returns
    /// whether the slot was written.
    pub fn merge_into(&self, params: &Params, slot: &mut f64) -> bool {
        match params.get(&self.name) {
            Some(value) if value.is_finite() => {
                *slot = self.clamp(*value);
                true
            }
            Some(value) => {
                log::warn!("Ignoring non-finite value {} for '{}'", value, self.name);
                false
            }
            None => false,
        }
    }
}
