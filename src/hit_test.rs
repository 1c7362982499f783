use super::*;
use crate::scene::{ElementKind, PartialElement, Relationship};

fn id(raw: &str) -> ElementId {
    ElementId::new(raw)
}

fn at(zoom: f64) -> ViewTransform {
    ViewTransform { zoom }
}

// =============================================================
// element_at
// =============================================================

#[test]
fn zoomed_pointer_maps_to_diagram_space() {
    let scene = SceneModel::new(vec![Element::circle("a", 5.0, 5.0, 10.0)], vec![]);
    let cfg = EngineConfig::default();
    let hit = hit_test(&scene, Point::new(10.0, 10.0), &at(2.0), &cfg);
    assert_eq!(hit, Some(Hit::Element(id("a"))));
}

#[test]
fn overlap_prefers_later_element() {
    let scene = SceneModel::new(
        vec![Element::circle("under", 0.0, 0.0, 30.0), Element::circle("over", 20.0, 0.0, 30.0)],
        vec![],
    );
    let cfg = EngineConfig::default();
    let el = element_at(&scene, Point::new(10.0, 0.0), &cfg).unwrap();
    assert_eq!(el.id, id("over"));
}

#[test]
fn overlap_prefers_first_when_topmost_disabled() {
    let scene = SceneModel::new(
        vec![Element::circle("under", 0.0, 0.0, 30.0), Element::circle("over", 20.0, 0.0, 30.0)],
        vec![],
    );
    let cfg = EngineConfig { prefer_topmost: false, ..EngineConfig::default() };
    let el = element_at(&scene, Point::new(10.0, 0.0), &cfg).unwrap();
    assert_eq!(el.id, id("under"));
}

#[test]
fn hidden_elements_are_transparent_to_hits() {
    let mut scene = SceneModel::new(
        vec![Element::circle("under", 0.0, 0.0, 30.0), Element::circle("over", 0.0, 0.0, 30.0)],
        vec![],
    );
    scene.update_element(&id("over"), &PartialElement { hidden: Some(true), ..Default::default() });
    let el = element_at(&scene, Point::new(0.0, 0.0), &EngineConfig::default()).unwrap();
    assert_eq!(el.id, id("under"));
}

#[test]
fn empty_space_misses() {
    let scene = SceneModel::new(vec![Element::circle("a", 0.0, 0.0, 10.0)], vec![]);
    assert!(hit_test(&scene, Point::new(100.0, 100.0), &at(1.0), &EngineConfig::default()).is_none());
}

#[test]
fn line_band_is_configurable() {
    let scene = SceneModel::new(vec![Element::new("l", ElementKind::Line, 0.0, 0.0, 100.0, 0.0)], vec![]);
    let p = Point::new(50.0, 8.0);
    assert!(element_at(&scene, p, &EngineConfig::default()).is_none());
    let wide = EngineConfig { line_hit_band: 10.0, ..EngineConfig::default() };
    assert!(element_at(&scene, p, &wide).is_some());
}

// =============================================================
// relationship_at
// =============================================================

fn linked() -> SceneModel {
    SceneModel::new(
        vec![Element::circle("a", 0.0, 0.0, 50.0), Element::circle("b", 200.0, 0.0, 50.0)],
        vec![Relationship::new("r", "a", "b")],
    )
}

#[test]
fn pointer_on_line_hits_relationship() {
    let scene = linked();
    let cfg = EngineConfig::default();
    let hit = hit_test(&scene, Point::new(100.0, 5.0), &at(1.0), &cfg);
    assert_eq!(hit, Some(Hit::Relationship(id("r"))));
}

#[test]
fn band_is_half_the_hit_stroke_in_pixels() {
    let scene = linked();
    let cfg = EngineConfig::default();
    let valid = scene.valid_relationships();
    // At zoom 2 the line sits at pixel y 0 from x 100 to 300.
    assert!(relationship_at(&valid, Point::new(120.0, 6.0), &at(2.0), &cfg).is_some());
    assert!(relationship_at(&valid, Point::new(120.0, 7.0), &at(2.0), &cfg).is_none());
}

#[test]
fn label_pill_hits_relationship() {
    let scene = linked();
    let valid = scene.valid_relationships();
    let cfg = EngineConfig::default();
    // Label anchor is (100, -20); the pill spans x 50..130, y -30..-10.
    assert!(relationship_at(&valid, Point::new(60.0, -25.0), &at(1.0), &cfg).is_some());
    assert!(relationship_at(&valid, Point::new(140.0, -25.0), &at(1.0), &cfg).is_none());
}

#[test]
fn relationship_wins_over_element_underneath() {
    let mut scene = linked();
    scene.insert_element(Element::circle("under", 100.0, 0.0, 20.0));
    let hit = hit_test(&scene, Point::new(100.0, 0.0), &at(1.0), &EngineConfig::default());
    assert_eq!(hit, Some(Hit::Relationship(id("r"))));
}

#[test]
fn element_wins_away_from_the_line() {
    let mut scene = linked();
    scene.insert_element(Element::circle("under", 100.0, 0.0, 20.0));
    let hit = hit_test(&scene, Point::new(100.0, 15.0), &at(1.0), &EngineConfig::default());
    assert_eq!(hit, Some(Hit::Element(id("under"))));
}

#[test]
fn dangling_relationship_is_not_hit() {
    let mut scene = linked();
    scene.remove(&id("b"));
    assert!(hit_test(&scene, Point::new(100.0, 0.0), &at(1.0), &EngineConfig::default()).is_none());
}

#[test]
fn later_relationship_wins() {
    let mut scene = linked();
    scene.insert_relationship(Relationship::new("r2", "b", "a"));
    let hit = hit_test(&scene, Point::new(100.0, 0.0), &at(1.0), &EngineConfig::default());
    assert_eq!(hit, Some(Hit::Relationship(id("r2"))));
}
