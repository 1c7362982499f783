//! Zoom-only view transform between diagram space and canvas pixels.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use crate::config::EngineConfig;
use crate::geometry::Point;

/// Zoom state of the canvas.
///
/// Diagram space maps to pixel space by a uniform scale; there is no pan
/// offset. `zoom` is a scale factor (1.0 = no zoom) kept inside the
/// configured bounds by every mutator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

impl ViewTransform {
    /// A transform at `zoom`, clamped to the configured bounds.
    #[must_use]
    pub fn new(zoom: f64, config: &EngineConfig) -> Self {
        Self { zoom: config.clamp_zoom(zoom) }
    }

    /// Convert a pixel-space point to diagram coordinates.
    #[must_use]
    pub fn to_diagram(&self, pixel: Point) -> Point {
        Point { x: pixel.x / self.zoom, y: pixel.y / self.zoom }
    }

    /// Convert a diagram-space point to pixel coordinates.
    #[must_use]
    pub fn to_pixel(&self, diagram: Point) -> Point {
        Point { x: diagram.x * self.zoom, y: diagram.y * self.zoom }
    }

    pub fn set_zoom(&mut self, zoom: f64, config: &EngineConfig) {
        self.zoom = config.clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self, config: &EngineConfig) {
        self.set_zoom(self.zoom + config.zoom_step, config);
    }

    pub fn zoom_out(&mut self, config: &EngineConfig) {
        self.set_zoom(self.zoom - config.zoom_step, config);
    }
}
