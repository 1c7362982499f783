//! Hit-testing: resolve a pointer position to the element or relationship under it.
//!
//! Relationship lines live on the vector overlay, which sits above the raster
//! layer, so they are tested first. Elements are tested in reverse draw order
//! so the one painted last wins where shapes overlap.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::config::EngineConfig;
use crate::consts::{LABEL_BOX_HEIGHT, LABEL_BOX_WIDTH, LABEL_BOX_X, LABEL_BOX_Y};
use crate::geometry::{self, Point};
use crate::scene::{Element, ElementId, SceneModel, ValidRelationship};
use crate::view::ViewTransform;

/// What a pointer position resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Element(ElementId),
    Relationship(ElementId),
}

/// The element under `world_pt` (diagram space).
///
/// Hidden elements never match. With `prefer_topmost` set, the element drawn
/// last wins; otherwise the first drawn does.
#[must_use]
pub fn element_at<'a>(scene: &'a SceneModel, world_pt: Point, config: &EngineConfig) -> Option<&'a Element> {
    let band = config.line_hit_band;
    let hits = |el: &&Element| geometry::point_in_shape(world_pt, el, band);
    if config.prefer_topmost {
        scene.visible_elements().rev().find(hits)
    } else {
        scene.visible_elements().find(hits)
    }
}

/// The relationship whose line or label sits under `pixel_pt`.
///
/// Lines are tested in pixel space against half the configured hit stroke
/// width, so the grab area stays constant on screen at any zoom.
#[must_use]
pub fn relationship_at<'a>(
    relationships: &[ValidRelationship<'a>],
    pixel_pt: Point,
    view: &ViewTransform,
    config: &EngineConfig,
) -> Option<&'a ElementId> {
    let half_width = config.relationship_hit_width / 2.0;
    relationships
        .iter()
        .rev()
        .find(|valid| {
            let seg = valid.segment.scale(view.zoom);
            geometry::distance_to_segment(pixel_pt, seg.start(), seg.end()) <= half_width
                || label_contains(valid, pixel_pt, view, config)
        })
        .map(|valid| &valid.relationship.id)
}

fn label_contains(valid: &ValidRelationship<'_>, pixel_pt: Point, view: &ViewTransform, config: &EngineConfig) -> bool {
    let anchor = view.to_pixel(valid.segment.label_anchor(config.label_offset));
    let left = anchor.x + LABEL_BOX_X;
    let top = anchor.y + LABEL_BOX_Y;
    pixel_pt.x >= left && pixel_pt.x <= left + LABEL_BOX_WIDTH && pixel_pt.y >= top && pixel_pt.y <= top + LABEL_BOX_HEIGHT
}

/// Resolve a pixel-space pointer position against the whole scene.
#[must_use]
pub fn hit_test(scene: &SceneModel, pixel_pt: Point, view: &ViewTransform, config: &EngineConfig) -> Option<Hit> {
    let relationships = scene.valid_relationships();
    if let Some(id) = relationship_at(&relationships, pixel_pt, view, config) {
        return Some(Hit::Relationship(id.clone()));
    }
    element_at(scene, view.to_diagram(pixel_pt), config).map(|el| Hit::Element(el.id.clone()))
}
