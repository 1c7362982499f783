//! Engine configuration: zoom bounds, hit-test thresholds, and highlight color.
//!
//! Every field has a default, so hosts can pass a partial JSON object (or
//! nothing at all) and only override what they care about.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_MAX_ZOOM: f64 = 2.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_LINE_HIT_BAND: f64 = 5.0;
pub const DEFAULT_RELATIONSHIP_HIT_WIDTH: f64 = 12.0;
pub const DEFAULT_GRID_SIZE: f64 = 20.0;
pub const DEFAULT_LABEL_OFFSET: f64 = 20.0;
pub const DEFAULT_SELECTION_COLOR: &str = "#1677ff";

/// Error returned by [`EngineConfig::from_json`] and [`EngineConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input was not a valid config object.
    #[error("failed to decode engine config: {0}")]
    Decode(#[from] serde_json::Error),
    /// Zoom bounds are non-positive or inverted.
    #[error("invalid zoom bounds: min {min}, max {max}")]
    ZoomBounds { min: f64, max: f64 },
    /// A threshold that must be non-negative (or positive) is not.
    #[error("invalid {name}: {value}")]
    Threshold { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change applied by one zoom-in / zoom-out step.
    pub zoom_step: f64,
    /// Half-height of the band around a line element that counts as a hit, in diagram units.
    pub line_hit_band: f64,
    /// Width of the invisible stroke around relationship lines, in pixels.
    pub relationship_hit_width: f64,
    /// Background grid cell size, in diagram units.
    pub grid_size: f64,
    /// Perpendicular distance of a relationship label from its line midpoint.
    pub label_offset: f64,
    /// When elements overlap, prefer the one drawn last.
    pub prefer_topmost: bool,
    pub selection_color: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
            line_hit_band: DEFAULT_LINE_HIT_BAND,
            relationship_hit_width: DEFAULT_RELATIONSHIP_HIT_WIDTH,
            grid_size: DEFAULT_GRID_SIZE,
            label_offset: DEFAULT_LABEL_OFFSET,
            prefer_topmost: true,
            selection_color: DEFAULT_SELECTION_COLOR.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] for malformed JSON and the validation
    /// errors of [`EngineConfig::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that bounds and thresholds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZoomBounds`] when `min_zoom` is not positive or
    /// exceeds `max_zoom`, and [`ConfigError::Threshold`] for negative bands or
    /// a non-positive grid size / zoom step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(ConfigError::ZoomBounds { min: self.min_zoom, max: self.max_zoom });
        }
        check_non_negative("zoom_step", self.zoom_step, false)?;
        check_non_negative("line_hit_band", self.line_hit_band, true)?;
        check_non_negative("relationship_hit_width", self.relationship_hit_width, true)?;
        check_non_negative("grid_size", self.grid_size, false)?;
        Ok(())
    }

    /// Clamp a zoom factor into the configured bounds.
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        let zoom = if zoom.is_nan() { 1.0 } else { zoom };
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

fn check_non_negative(name: &'static str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    let ok = value.is_finite() && if allow_zero { value >= 0.0 } else { value > 0.0 };
    if ok { Ok(()) } else { Err(ConfigError::Threshold { name, value }) }
}
