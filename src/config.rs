//! Tunables for a [`LineStrip`](crate::LineStrip).
//!
//! The struct deserializes with per-field defaults so it can sit inside an
//! application's own TOML config under any table name.

use serde::Deserialize;

use crate::editable::DEFAULT_MIN_CAPACITY;

/// Sizing and recompute thresholds for a strip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LineStripConfig {
    /// Logical vertices to preallocate in every column.
    pub initial_capacity: usize,
    /// Floor, in slots, for any column reallocation.
    pub min_buffer_capacity: usize,
    /// Relative aspect-ratio change that invalidates all stored mileage.
    pub aspect_ratio_tolerance: f64,
}

impl Default for LineStripConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            min_buffer_capacity: DEFAULT_MIN_CAPACITY,
            aspect_ratio_tolerance: 1e-3,
        }
    }
}

impl LineStripConfig {
    /// Defaults with a specific initial capacity.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    /// Whether moving from `previous` to `current` changes the aspect ratio
    /// by more than the tolerance.
    pub fn aspect_changed(&self, previous: f64, current: f64) -> bool {
        ((current - previous) / previous).abs() > self.aspect_ratio_tolerance
    }
}
