#![allow(clippy::float_cmp)]

use super::*;
use crate::scene::{PartialElement, Relationship};

// =============================================================
// Recording surface
// =============================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Clear,
    Save,
    Restore,
    Stroke(String, f64),
    Fill(String),
    Font(f64),
    Anchor(TextAnchor),
    Line(Point, Point),
    Circle(Point, f64),
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    Text(String, Point),
    Image(&'static str, Point, f64, f64),
}

struct RecordingSurface {
    width: f64,
    height: f64,
    calls: Vec<Call>,
}

impl RecordingSurface {
    fn new(width: f64, height: f64) -> Self {
        Self { width, height, calls: Vec::new() }
    }

    fn lines(&self) -> Vec<(Point, Point)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Line(a, b) => Some((*a, *b)),
                _ => None,
            })
            .collect()
    }

    fn texts(&self) -> Vec<(String, Point)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Text(t, p) => Some((t.clone(), *p)),
                _ => None,
            })
            .collect()
    }

    fn without_grid(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Line(..)) && **c != Call::Stroke(GRID_COLOR.into(), GRID_LINE_WIDTH))
            .cloned()
            .collect()
    }
}

impl RasterSurface for RecordingSurface {
    type Image = &'static str;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
        self.calls.push(Call::Clear);
    }

    fn save(&mut self) {
        self.calls.push(Call::Save);
    }

    fn restore(&mut self) {
        self.calls.push(Call::Restore);
    }

    fn set_stroke(&mut self, color: &str, width: f64) {
        self.calls.push(Call::Stroke(color.to_owned(), width));
    }

    fn set_fill(&mut self, color: &str) {
        self.calls.push(Call::Fill(color.to_owned()));
    }

    fn set_font(&mut self, px: f64) {
        self.calls.push(Call::Font(px));
    }

    fn set_text_anchor(&mut self, anchor: TextAnchor) {
        self.calls.push(Call::Anchor(anchor));
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * 10.0
    }

    fn stroke_line(&mut self, from: Point, to: Point) {
        self.calls.push(Call::Line(from, to));
    }

    fn draw_circle(&mut self, center: Point, radius: f64) -> Result<(), RenderError> {
        self.calls.push(Call::Circle(center, radius));
        Ok(())
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(Call::FillRect(x, y, width, height));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(Call::StrokeRect(x, y, width, height));
    }

    fn fill_text(&mut self, text: &str, at: Point) -> Result<(), RenderError> {
        self.calls.push(Call::Text(text.to_owned(), at));
        Ok(())
    }

    fn draw_image_in_circle(
        &mut self,
        image: &&'static str,
        center: Point,
        clip_radius: f64,
        size: f64,
    ) -> Result<(), RenderError> {
        self.calls.push(Call::Image(*image, center, clip_radius, size));
        Ok(())
    }
}

struct Fixture {
    scene: SceneModel,
    selection: Selection,
    view: ViewTransform,
    config: EngineConfig,
    portraits: Portraits<&'static str>,
}

impl Fixture {
    fn new(elements: Vec<Element>) -> Self {
        Self {
            scene: SceneModel::new(elements, vec![]),
            selection: Selection::new(),
            view: ViewTransform::default(),
            config: EngineConfig::default(),
            portraits: Portraits::new(),
        }
    }

    fn cx(&self) -> DrawContext<'_, &'static str> {
        DrawContext {
            scene: &self.scene,
            selection: &self.selection,
            view: &self.view,
            config: &self.config,
            portraits: &self.portraits,
        }
    }

    fn draw(&self, width: f64, height: f64) -> RecordingSurface {
        let mut surface = RecordingSurface::new(width, height);
        draw_scene(&mut surface, &self.cx()).unwrap();
        surface
    }
}

// =============================================================
// Grid
// =============================================================

#[test]
fn grid_covers_surface_at_cell_size() {
    let fx = Fixture::new(vec![]);
    let surface = fx.draw(100.0, 60.0);
    assert_eq!(surface.calls[0], Call::Clear);
    let lines = surface.lines();
    // x = 0, 20, 40, 60, 80 and y = 0, 20, 40
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[1], (Point::new(20.0, 0.0), Point::new(20.0, 60.0)));
    assert_eq!(lines[7], (Point::new(0.0, 40.0), Point::new(100.0, 40.0)));
}

#[test]
fn grid_scales_with_zoom() {
    let mut fx = Fixture::new(vec![]);
    fx.view = ViewTransform { zoom: 2.0 };
    let lines = fx.draw(100.0, 40.0).lines();
    // x = 0, 40, 80 and y = 0
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1].0, Point::new(40.0, 0.0));
}

// =============================================================
// Circles
// =============================================================

#[test]
fn circle_fill_follows_character_type() {
    let mut hero = Element::circle("h", 100.0, 100.0, 30.0);
    hero.character_type = Some(CharacterType::Protagonist);
    let mut villain = Element::circle("v", 300.0, 100.0, 30.0);
    villain.character_type = Some(CharacterType::Antagonist);
    let plain = Element::circle("p", 500.0, 100.0, 30.0);

    let calls = Fixture::new(vec![hero, villain, plain]).draw(10.0, 10.0).without_grid();
    let fills: Vec<&Call> = calls.iter().filter(|c| matches!(c, Call::Fill(_))).collect();
    assert_eq!(
        fills,
        [&Call::Fill(PROTAGONIST_FILL.into()), &Call::Fill(ANTAGONIST_FILL.into()), &Call::Fill(NODE_FILL.into())]
    );
}

#[test]
fn circle_geometry_and_label_scale_with_zoom() {
    let mut el = Element::circle("a", 50.0, 40.0, 20.0);
    el.text = Some("Ada".into());
    let mut fx = Fixture::new(vec![el]);
    fx.view = ViewTransform { zoom: 2.0 };

    let surface = fx.draw(10.0, 10.0);
    let calls = surface.without_grid();
    assert!(calls.contains(&Call::Circle(Point::new(100.0, 80.0), 40.0)));
    assert!(calls.contains(&Call::Font(24.0)));
    assert!(calls.contains(&Call::Anchor(TextAnchor::BaselineCenter)));
    // radius 40 + gap 20 * 2 below the center
    assert_eq!(surface.texts(), [("Ada".to_owned(), Point::new(100.0, 160.0))]);
}

#[test]
fn selected_element_uses_selection_stroke() {
    let mut fx = Fixture::new(vec![Element::circle("a", 0.0, 0.0, 10.0), Element::circle("b", 50.0, 0.0, 10.0)]);
    fx.selection.insert(ElementId::new("a"));
    let calls = fx.draw(10.0, 10.0).without_grid();

    let strokes: Vec<&Call> = calls.iter().filter(|c| matches!(c, Call::Stroke(..))).collect();
    assert_eq!(strokes, [&Call::Stroke("#1677ff".into(), 2.0), &Call::Stroke(DEFAULT_STROKE.into(), 1.0)]);
}

#[test]
fn explicit_color_strokes_unselected_element() {
    let mut el = Element::circle("a", 0.0, 0.0, 10.0);
    el.color = Some("#abcdef".into());
    let calls = Fixture::new(vec![el]).draw(10.0, 10.0).without_grid();
    assert!(calls.contains(&Call::Stroke("#abcdef".into(), 1.0)));
}

#[test]
fn portrait_drawn_only_when_ready() {
    let mut el = Element::circle("a", 10.0, 10.0, 50.0);
    el.profile_image = Some("a.png".into());
    let mut fx = Fixture::new(vec![el]);
    let req = fx.portraits.sync(&fx.scene).remove(0);

    let before = fx.draw(10.0, 10.0).without_grid();
    assert!(!before.iter().any(|c| matches!(c, Call::Image(..))));

    fx.portraits.complete(&req.id, req.generation, Ok("decoded"));
    let after = fx.draw(10.0, 10.0).without_grid();
    assert!(after.contains(&Call::Image("decoded", Point::new(10.0, 10.0), 45.0, 90.0)));
}

#[test]
fn repaint_portrait_draws_only_the_image() {
    let mut el = Element::circle("a", 10.0, 10.0, 50.0);
    el.profile_image = Some("a.png".into());
    let mut fx = Fixture::new(vec![el, Element::circle("b", 200.0, 10.0, 50.0)]);
    let req = fx.portraits.sync(&fx.scene).remove(0);
    fx.portraits.complete(&req.id, req.generation, Ok("decoded"));

    let mut surface = RecordingSurface::new(10.0, 10.0);
    repaint_portrait(&mut surface, &fx.cx(), &req.id).unwrap();
    assert_eq!(surface.calls, [Call::Image("decoded", Point::new(10.0, 10.0), 45.0, 90.0)]);
}

#[test]
fn repaint_portrait_skips_hidden_or_missing_nodes() {
    let mut el = Element::circle("a", 10.0, 10.0, 50.0);
    el.profile_image = Some("a.png".into());
    let mut fx = Fixture::new(vec![el]);
    let req = fx.portraits.sync(&fx.scene).remove(0);
    fx.portraits.complete(&req.id, req.generation, Ok("decoded"));
    fx.scene.update_element(&req.id, &PartialElement { hidden: Some(true), ..Default::default() });

    let mut surface = RecordingSurface::new(10.0, 10.0);
    repaint_portrait(&mut surface, &fx.cx(), &req.id).unwrap();
    repaint_portrait(&mut surface, &fx.cx(), &ElementId::new("ghost")).unwrap();
    assert!(surface.calls.is_empty());
}

// =============================================================
// Textboxes and lines
// =============================================================

#[test]
fn textbox_draws_box_and_wrapped_lines() {
    let mut el = Element::new("t", ElementKind::Textbox, 100.0, 50.0, 120.0, 100.0);
    el.text = Some("hello big world".into());
    el.font_color = Some("#333333".into());
    let surface = Fixture::new(vec![el]).draw(10.0, 10.0);
    let calls = surface.without_grid();

    assert!(calls.contains(&Call::FillRect(40.0, 0.0, 120.0, 100.0)));
    assert!(calls.contains(&Call::StrokeRect(40.0, 0.0, 120.0, 100.0)));
    assert!(calls.contains(&Call::Fill("#333333".into())));
    assert!(calls.contains(&Call::Anchor(TextAnchor::TopLeft)));

    // Inner width 104 fits ten 10px characters per line.
    let texts = surface.texts();
    assert_eq!(texts[0], ("hello big".to_owned(), Point::new(48.0, 8.0)));
    assert_eq!(texts[1].0, "world");
    assert!((texts[1].1.y - (8.0 + 14.0 * 1.4)).abs() < 1e-9);
}

#[test]
fn empty_textbox_draws_no_text() {
    let el = Element::new("t", ElementKind::Textbox, 0.0, 0.0, 50.0, 50.0);
    let calls = Fixture::new(vec![el]).draw(10.0, 10.0).without_grid();
    assert!(!calls.iter().any(|c| matches!(c, Call::Text(..) | Call::Font(_))));
}

#[test]
fn line_element_runs_right_from_its_origin() {
    let el = Element::new("l", ElementKind::Line, 10.0, 20.0, 30.0, 0.0);
    let mut fx = Fixture::new(vec![el]);
    fx.view = ViewTransform { zoom: 2.0 };
    let surface = fx.draw(1.0, 1.0);
    let lines = surface.lines();
    assert_eq!(lines.last(), Some(&(Point::new(20.0, 40.0), Point::new(80.0, 40.0))));
}

// =============================================================
// Pass structure
// =============================================================

#[test]
fn hidden_and_unknown_elements_are_skipped() {
    let mut hidden = Element::circle("h", 0.0, 0.0, 10.0);
    hidden.hidden = true;
    let unknown = Element::new("u", ElementKind::Unknown, 0.0, 0.0, 10.0, 10.0);
    let calls = Fixture::new(vec![hidden, unknown]).draw(1.0, 1.0).without_grid();
    assert!(!calls.iter().any(|c| matches!(c, Call::Circle(..) | Call::FillRect(..))));
}

#[test]
fn elements_draw_in_insertion_order() {
    let fx = Fixture::new(vec![Element::circle("b", 1.0, 0.0, 5.0), Element::circle("a", 2.0, 0.0, 5.0)]);
    let calls = fx.draw(1.0, 1.0).without_grid();
    let centers: Vec<f64> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Circle(p, _) => Some(p.x),
            _ => None,
        })
        .collect();
    assert_eq!(centers, [1.0, 2.0]);
}

#[test]
fn saves_and_restores_balance() {
    let mut fx = Fixture::new(vec![
        Element::circle("a", 0.0, 0.0, 10.0),
        Element::new("t", ElementKind::Textbox, 0.0, 0.0, 50.0, 50.0),
    ]);
    fx.scene.insert_relationship(Relationship::new("r", "a", "t"));
    let calls = fx.draw(40.0, 40.0).calls;
    let saves = calls.iter().filter(|c| **c == Call::Save).count();
    let restores = calls.iter().filter(|c| **c == Call::Restore).count();
    assert_eq!(saves, restores);
    assert_eq!(saves, 3);
}
