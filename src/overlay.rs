//! Vector layer: relationship lines, arrowheads and label pills as SVG.
//!
//! The overlay is stacked above the raster canvas and redrawn whenever the
//! scene, selection or zoom changes. Output depends only on its inputs, so
//! building it twice from the same state yields identical markup.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use svg::Document;
use svg::node::element::{Definitions, Group, Line, Marker, Polygon, Rectangle, Text};

use crate::config::EngineConfig;
use crate::consts::{
    LABEL_BORDER, LABEL_BOX_HEIGHT, LABEL_BOX_WIDTH, LABEL_BOX_X, LABEL_BOX_Y, LABEL_FONT_SIZE, LABEL_PLACEHOLDER,
    LABEL_TEXT_COLOR, RELATIONSHIP_SELECTED_STROKE_WIDTH, RELATIONSHIP_STROKE_WIDTH,
};
use crate::input::Selection;
use crate::scene::ValidRelationship;
use crate::view::ViewTransform;

/// Id of the arrowhead marker for the relationship with id `id`.
///
/// Bytes outside `[A-Za-z0-9-]` are written as `_` plus two hex digits, so
/// the id is safe inside `url(#...)` and distinct ids stay distinct.
#[must_use]
pub fn marker_id(id: &str) -> String {
    let mut out = String::with_capacity("arrowhead-".len() + id.len());
    out.push_str("arrowhead-");
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

/// Build the overlay document for `relationships`.
#[must_use]
pub fn build_overlay(
    relationships: &[ValidRelationship<'_>],
    selection: &Selection,
    view: &ViewTransform,
    config: &EngineConfig,
) -> Document {
    let mut doc = Document::new()
        .set("class", "relationships-layer")
        .set("width", "100%")
        .set("height", "100%")
        .add(marker_definitions(relationships));

    for valid in relationships {
        doc = doc.add(relationship_group(valid, selection, view, config));
    }
    doc
}

/// Serialized overlay markup.
#[must_use]
pub fn render_overlay(
    relationships: &[ValidRelationship<'_>],
    selection: &Selection,
    view: &ViewTransform,
    config: &EngineConfig,
) -> String {
    build_overlay(relationships, selection, view, config).to_string()
}

fn marker_definitions(relationships: &[ValidRelationship<'_>]) -> Definitions {
    let mut defs = Definitions::new();
    for valid in relationships {
        let rel = valid.relationship;
        let marker = Marker::new()
            .set("id", marker_id(rel.id.as_str()))
            .set("markerWidth", 10)
            .set("markerHeight", 7)
            .set("refX", 9)
            .set("refY", 3.5)
            .set("orient", "auto")
            .add(Polygon::new().set("points", "0 0, 10 3.5, 0 7").set("fill", rel.resolved_color()));
        defs = defs.add(marker);
    }
    defs
}

fn relationship_group(
    valid: &ValidRelationship<'_>,
    selection: &Selection,
    view: &ViewTransform,
    config: &EngineConfig,
) -> Group {
    let rel = valid.relationship;
    let selected = selection.contains(&rel.id);
    let color = rel.resolved_color();
    let seg = valid.segment.scale(view.zoom);

    let mut line = Line::new()
        .set("class", if selected { "relationship-line selected" } else { "relationship-line" })
        .set("x1", seg.x1)
        .set("y1", seg.y1)
        .set("x2", seg.x2)
        .set("y2", seg.y2)
        .set("stroke", color)
        .set("stroke-width", if selected { RELATIONSHIP_SELECTED_STROKE_WIDTH } else { RELATIONSHIP_STROKE_WIDTH });
    if let Some(dash) = rel.line_style.dash_array() {
        line = line.set("stroke-dasharray", dash);
    }
    if rel.directed {
        line = line.set("marker-end", format!("url(#{})", marker_id(rel.id.as_str())));
    }
    if selected {
        line = line.set("style", "filter: drop-shadow(0 0 3px rgba(22, 119, 255, 0.5))");
    }

    let hit_line = Line::new()
        .set("x1", seg.x1)
        .set("y1", seg.y1)
        .set("x2", seg.x2)
        .set("y2", seg.y2)
        .set("stroke", "transparent")
        .set("stroke-width", config.relationship_hit_width);

    let anchor = view.to_pixel(valid.segment.label_anchor(config.label_offset));
    let pill = Rectangle::new()
        .set("class", "relationship-label-bg")
        .set("x", LABEL_BOX_X)
        .set("y", LABEL_BOX_Y)
        .set("width", LABEL_BOX_WIDTH)
        .set("height", LABEL_BOX_HEIGHT)
        .set("rx", LABEL_BOX_HEIGHT / 2.0)
        .set("ry", LABEL_BOX_HEIGHT / 2.0)
        .set("fill", "white")
        .set("stroke", if selected { color } else { LABEL_BORDER })
        .set("stroke-width", if selected { 2 } else { 1 });

    let content = if rel.text().is_empty() { LABEL_PLACEHOLDER } else { rel.text() };
    let label = Text::new(content)
        .set("x", LABEL_BOX_X + LABEL_BOX_WIDTH / 2.0)
        .set("y", 0)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-size", LABEL_FONT_SIZE * view.zoom)
        .set("fill", LABEL_TEXT_COLOR);

    Group::new()
        .set("data-relationship-id", rel.id.as_str())
        .add(line)
        .add(hit_line)
        .add(
            Group::new()
                .set("transform", format!("translate({}, {})", anchor.x, anchor.y))
                .add(pill)
                .add(label),
        )
}
