//! Plane geometry for the diagram: points, edge attachment, point-in-shape.
//!
//! Everything here works in diagram space unless a function says otherwise.
//! Elements store their center in `x` / `y`; circles take their radius from
//! half the width.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{DEFAULT_NODE_RADIUS, FALLBACK_EDGE_LENGTH};
use crate::scene::{Element, ElementKind};

/// A point in either pixel or diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Multiply both coordinates by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self { x: self.x * factor, y: self.y * factor }
    }
}

/// A straight segment between two attachment points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl EdgeSegment {
    #[must_use]
    pub fn new(start: Point, end: Point) -> Self {
        Self { x1: start.x, y1: start.y, x2: end.x, y2: end.y }
    }

    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[must_use]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    #[must_use]
    pub fn midpoint(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Direction of the segment in radians, measured from start to end.
    #[must_use]
    pub fn angle(&self) -> f64 {
        (self.y2 - self.y1).atan2(self.x2 - self.x1)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    /// Midpoint pushed `offset` units along the left-hand normal.
    #[must_use]
    pub fn label_anchor(&self, offset: f64) -> Point {
        let (sin, cos) = self.angle().sin_cos();
        let mid = self.midpoint();
        Point::new(mid.x + sin * offset, mid.y - cos * offset)
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.start().scale(factor), self.end().scale(factor))
    }
}

/// Radius used to attach relationship lines to `element`.
///
/// Falls back to [`DEFAULT_NODE_RADIUS`] when the width is zero, negative or
/// not finite.
#[must_use]
pub fn attachment_radius(element: &Element) -> f64 {
    if element.width.is_finite() && element.width > 0.0 {
        element.width / 2.0
    } else {
        DEFAULT_NODE_RADIUS
    }
}

/// Points where a line between the centers of `source` and `target` crosses
/// each node's boundary.
///
/// Nodes sharing a center get a short horizontal stub starting at that center
/// so callers always receive finite coordinates.
#[must_use]
pub fn edge_points(source: &Element, target: &Element) -> EdgeSegment {
    let dx = target.x - source.x;
    let dy = target.y - source.y;
    let distance = dx.hypot(dy);

    if distance < f64::EPSILON {
        return EdgeSegment {
            x1: source.x,
            y1: source.y,
            x2: source.x + FALLBACK_EDGE_LENGTH,
            y2: source.y,
        };
    }

    let ux = dx / distance;
    let uy = dy / distance;
    let source_radius = attachment_radius(source);
    let target_radius = attachment_radius(target);

    EdgeSegment {
        x1: source.x + ux * source_radius,
        y1: source.y + uy * source_radius,
        x2: target.x - ux * target_radius,
        y2: target.y - uy * target_radius,
    }
}

/// Whether `point` lies on `element`.
///
/// Lines count as hit inside a rectangular band of `line_band` units around
/// the segment from `(x, y)` to `(x + width, y)`. Hidden elements and unknown
/// kinds are never hit.
#[must_use]
pub fn point_in_shape(point: Point, element: &Element, line_band: f64) -> bool {
    if element.hidden {
        return false;
    }
    match element.kind {
        ElementKind::Circle => point.distance(element.center()) <= element.width / 2.0,
        ElementKind::Textbox => {
            let hw = element.width / 2.0;
            let hh = element.height / 2.0;
            point.x >= element.x - hw
                && point.x <= element.x + hw
                && point.y >= element.y - hh
                && point.y <= element.y + hh
        }
        ElementKind::Line => {
            let end_x = element.x + element.width;
            point.x >= element.x - line_band
                && point.x <= end_x + line_band
                && point.y >= element.y - line_band
                && point.y <= element.y + line_band
        }
        ElementKind::Unknown => false,
    }
}

/// Shortest distance from `point` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx.mul_add(dx, dy * dy);
    if len_sq < f64::EPSILON {
        return point.distance(a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    point.distance(Point::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y)))
}
