//! Shared numeric and color constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Node radius used for edge attachment when an element has no usable width.
pub const DEFAULT_NODE_RADIUS: f64 = 50.0;

/// Length of the horizontal stub drawn between nodes sharing a center.
pub const FALLBACK_EDGE_LENGTH: f64 = 50.0;

// ── Text ────────────────────────────────────────────────────────

/// Inner padding of a textbox, in diagram units.
pub const TEXTBOX_PADDING: f64 = 8.0;

/// Textbox font size when the element does not set one.
pub const DEFAULT_FONT_SIZE: f64 = 14.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.4;

/// Font size of the name label under a circle node.
pub const CIRCLE_LABEL_FONT_SIZE: f64 = 12.0;

/// Gap between a circle's bottom edge and its name label baseline.
pub const CIRCLE_LABEL_GAP: f64 = 20.0;

// ── Portraits ───────────────────────────────────────────────────

/// Portrait clip disc radius relative to the node radius.
pub const PORTRAIT_CLIP_RATIO: f64 = 0.9;

/// Portrait image edge length relative to the node radius.
pub const PORTRAIT_SIZE_RATIO: f64 = 1.8;

// ── Colors ──────────────────────────────────────────────────────

pub const GRID_COLOR: &str = "#f0f0f0";
pub const GRID_LINE_WIDTH: f64 = 0.5;

/// Stroke of an unselected element with no explicit color.
pub const DEFAULT_STROKE: &str = "#000000";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const NODE_FILL: &str = "#ffffff";

pub const PROTAGONIST_FILL: &str = "#e6f7ff";
pub const ANTAGONIST_FILL: &str = "#fff1f0";
pub const SUPPORTING_FILL: &str = "#f6ffed";

/// Default relationship color.
pub const RELATIONSHIP_COLOR: &str = "#1677ff";

/// Default color of `child-of` relationships.
pub const CHILD_OF_COLOR: &str = "#fa541c";

// ── Relationship overlay ────────────────────────────────────────

pub const RELATIONSHIP_STROKE_WIDTH: f64 = 2.0;
pub const RELATIONSHIP_SELECTED_STROKE_WIDTH: f64 = 4.0;

/// Label pill, relative to the label anchor, in pixels.
pub const LABEL_BOX_X: f64 = -50.0;
pub const LABEL_BOX_Y: f64 = -10.0;
pub const LABEL_BOX_WIDTH: f64 = 80.0;
pub const LABEL_BOX_HEIGHT: f64 = 20.0;

pub const LABEL_BORDER: &str = "#ddd";
pub const LABEL_TEXT_COLOR: &str = "#333";
pub const LABEL_FONT_SIZE: f64 = 12.0;

/// Shown in the label pill when a relationship has no text.
pub const LABEL_PLACEHOLDER: &str = "relationship";
