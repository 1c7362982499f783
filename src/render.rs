//! Raster layer: draws the grid and every visible element to a 2D surface.
//!
//! Drawing goes through the [`RasterSurface`] trait so the same code drives
//! the browser canvas ([`CanvasSurface`]) and a recording double in tests.
//! Nothing here mutates scene or UI state; callers pass read-only views in a
//! [`DrawContext`] and get pixels out. Relationship lines are not drawn here,
//! they live on the vector overlay (see [`crate::overlay`]).
//!
//! All coordinates handed to the surface are in pixel space (diagram
//! coordinates multiplied by the zoom).

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::config::EngineConfig;
use crate::consts::{
    ANTAGONIST_FILL, CIRCLE_LABEL_FONT_SIZE, CIRCLE_LABEL_GAP, DEFAULT_STROKE, DEFAULT_TEXT_COLOR, GRID_COLOR,
    GRID_LINE_WIDTH, NODE_FILL, PORTRAIT_CLIP_RATIO, PORTRAIT_SIZE_RATIO, PROTAGONIST_FILL, SUPPORTING_FILL,
};
use crate::geometry::Point;
use crate::images::Portraits;
use crate::input::Selection;
use crate::scene::{CharacterType, Element, ElementId, ElementKind, SceneModel};
use crate::text;
use crate::view::ViewTransform;

/// A drawing call failed on the underlying surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(String),
}

impl From<JsValue> for RenderError {
    fn from(value: JsValue) -> Self {
        Self::Surface(format!("{value:?}"))
    }
}

/// Where text is anchored relative to the point passed to `fill_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// Left-aligned, top baseline (textbox content).
    TopLeft,
    /// Centered on the alphabetic baseline (circle name labels).
    BaselineCenter,
}

/// The subset of a 2D canvas API the raster layer needs.
pub trait RasterSurface {
    /// Decoded image type that can be drawn into the surface.
    type Image;

    /// Surface size in pixels.
    fn size(&self) -> (f64, f64);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn save(&mut self);

    fn restore(&mut self);

    fn set_stroke(&mut self, color: &str, width: f64);

    fn set_fill(&mut self, color: &str);

    /// Select a sans-serif font of `px` pixels.
    fn set_font(&mut self, px: f64);

    fn set_text_anchor(&mut self, anchor: TextAnchor);

    /// Advance width of `text` in the current font.
    fn measure_text(&self, text: &str) -> f64;

    fn stroke_line(&mut self, from: Point, to: Point);

    /// Fill then stroke a circle with the current styles.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the surface rejects the path.
    fn draw_circle(&mut self, center: Point, radius: f64) -> Result<(), RenderError>;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// # Errors
    ///
    /// Returns [`RenderError`] if the surface rejects the text.
    fn fill_text(&mut self, text: &str, at: Point) -> Result<(), RenderError>;

    /// Draw `image` as a `size` x `size` square centered on `center`,
    /// clipped to a disc of `clip_radius`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if clipping or drawing fails.
    fn draw_image_in_circle(
        &mut self,
        image: &Self::Image,
        center: Point,
        clip_radius: f64,
        size: f64,
    ) -> Result<(), RenderError>;
}

/// Read-only state a raster pass draws from.
pub struct DrawContext<'a, I> {
    pub scene: &'a SceneModel,
    pub selection: &'a Selection,
    pub view: &'a ViewTransform,
    pub config: &'a EngineConfig,
    pub portraits: &'a Portraits<I>,
}

/// Draw the full raster layer: clear, grid, then visible elements in
/// insertion order (later elements on top).
///
/// # Errors
///
/// Returns the first [`RenderError`] raised by the surface.
pub fn draw_scene<S: RasterSurface>(surface: &mut S, cx: &DrawContext<'_, S::Image>) -> Result<(), RenderError> {
    let (width, height) = surface.size();
    surface.clear_rect(0.0, 0.0, width, height);
    draw_grid(surface, cx.config.grid_size * cx.view.zoom, width, height);

    for el in cx.scene.visible_elements() {
        draw_element(surface, el, cx)?;
    }
    Ok(())
}

/// Draw only the portrait of `id` on top of what is already there.
///
/// Called when an image finishes loading after the main pass. Does nothing
/// when the node is gone, hidden, not a circle, or has no ready image.
///
/// # Errors
///
/// Returns [`RenderError`] if the surface fails to draw the image.
pub fn repaint_portrait<S: RasterSurface>(
    surface: &mut S,
    cx: &DrawContext<'_, S::Image>,
    id: &ElementId,
) -> Result<(), RenderError> {
    match cx.scene.element(id) {
        Some(el) if !el.hidden && el.kind == ElementKind::Circle => draw_portrait(surface, el, cx),
        _ => Ok(()),
    }
}

// =============================================================
// Grid
// =============================================================

fn draw_grid<S: RasterSurface>(surface: &mut S, step: f64, width: f64, height: f64) {
    if !(step.is_finite() && step > 0.0) {
        return;
    }
    surface.save();
    surface.set_stroke(GRID_COLOR, GRID_LINE_WIDTH);

    let mut i = 0.0_f64;
    while i * step < width {
        let x = i * step;
        surface.stroke_line(Point::new(x, 0.0), Point::new(x, height));
        i += 1.0;
    }
    let mut j = 0.0_f64;
    while j * step < height {
        let y = j * step;
        surface.stroke_line(Point::new(0.0, y), Point::new(width, y));
        j += 1.0;
    }

    surface.restore();
}

// =============================================================
// Element dispatch
// =============================================================

fn draw_element<S: RasterSurface>(surface: &mut S, el: &Element, cx: &DrawContext<'_, S::Image>) -> Result<(), RenderError> {
    surface.save();
    if cx.selection.contains(&el.id) {
        surface.set_stroke(&cx.config.selection_color, 2.0);
    } else {
        surface.set_stroke(el.color.as_deref().unwrap_or(DEFAULT_STROKE), 1.0);
    }

    let result = match el.kind {
        ElementKind::Circle => draw_circle_node(surface, el, cx),
        ElementKind::Textbox => draw_textbox(surface, el, cx.view.zoom),
        ElementKind::Line => {
            let zoom = cx.view.zoom;
            let start = el.center().scale(zoom);
            surface.stroke_line(start, Point::new(start.x + el.width * zoom, start.y));
            Ok(())
        }
        ElementKind::Unknown => Ok(()),
    };
    surface.restore();
    result
}

fn character_fill(kind: Option<CharacterType>) -> &'static str {
    match kind {
        Some(CharacterType::Protagonist) => PROTAGONIST_FILL,
        Some(CharacterType::Antagonist) => ANTAGONIST_FILL,
        Some(CharacterType::Supporting) => SUPPORTING_FILL,
        Some(CharacterType::Other) | None => NODE_FILL,
    }
}

fn draw_circle_node<S: RasterSurface>(
    surface: &mut S,
    el: &Element,
    cx: &DrawContext<'_, S::Image>,
) -> Result<(), RenderError> {
    let zoom = cx.view.zoom;
    let center = el.center().scale(zoom);
    let radius = el.width / 2.0 * zoom;

    surface.set_fill(character_fill(el.character_type));
    surface.draw_circle(center, radius)?;
    draw_portrait(surface, el, cx)?;

    if !el.text().is_empty() {
        surface.set_fill(DEFAULT_TEXT_COLOR);
        surface.set_font(CIRCLE_LABEL_FONT_SIZE * zoom);
        surface.set_text_anchor(TextAnchor::BaselineCenter);
        surface.fill_text(el.text(), Point::new(center.x, center.y + radius + CIRCLE_LABEL_GAP * zoom))?;
    }
    Ok(())
}

fn draw_portrait<S: RasterSurface>(surface: &mut S, el: &Element, cx: &DrawContext<'_, S::Image>) -> Result<(), RenderError> {
    let Some(image) = cx.portraits.image(&el.id) else {
        return Ok(());
    };
    let zoom = cx.view.zoom;
    let radius = el.width / 2.0 * zoom;
    surface.draw_image_in_circle(image, el.center().scale(zoom), radius * PORTRAIT_CLIP_RATIO, radius * PORTRAIT_SIZE_RATIO)
}

fn draw_textbox<S: RasterSurface>(surface: &mut S, el: &Element, zoom: f64) -> Result<(), RenderError> {
    let width = el.width * zoom;
    let height = el.height * zoom;
    let left = el.x * zoom - width / 2.0;
    let top = el.y * zoom - height / 2.0;

    surface.set_fill(NODE_FILL);
    surface.fill_rect(left, top, width, height);
    surface.stroke_rect(left, top, width, height);

    if el.text().is_empty() {
        return Ok(());
    }

    surface.set_font(text::textbox_font_size(el, zoom));
    surface.set_fill(el.font_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR));
    surface.set_text_anchor(TextAnchor::TopLeft);

    let layout = text::layout_textbox(|s| surface.measure_text(s), el, zoom);
    if layout.truncated > 0 {
        log::debug!("textbox {}: {} line(s) clipped", el.id, layout.truncated);
    }
    for line in &layout.lines {
        surface.fill_text(&line.text, line.origin)?;
    }
    Ok(())
}

// =============================================================
// Browser surface
// =============================================================

/// [`RasterSurface`] backed by a browser `<canvas>` 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx }
    }
}

impl RasterSurface for CanvasSurface {
    type Image = HtmlImageElement;

    fn size(&self) -> (f64, f64) {
        (f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_stroke(&mut self, color: &str, width: f64) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
    }

    fn set_fill(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_font(&mut self, px: f64) {
        self.ctx.set_font(&format!("{px}px Arial, sans-serif"));
    }

    fn set_text_anchor(&mut self, anchor: TextAnchor) {
        match anchor {
            TextAnchor::TopLeft => {
                self.ctx.set_text_align("left");
                self.ctx.set_text_baseline("top");
            }
            TextAnchor::BaselineCenter => {
                self.ctx.set_text_align("center");
                self.ctx.set_text_baseline("alphabetic");
            }
        }
    }

    fn measure_text(&self, text: &str) -> f64 {
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(_) => f64::INFINITY,
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn draw_circle(&mut self, center: Point, radius: f64) -> Result<(), RenderError> {
        self.ctx.begin_path();
        self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, 2.0 * PI)?;
        self.ctx.fill();
        self.ctx.stroke();
        Ok(())
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.stroke_rect(x, y, width, height);
    }

    fn fill_text(&mut self, text: &str, at: Point) -> Result<(), RenderError> {
        self.ctx.fill_text(text, at.x, at.y)?;
        Ok(())
    }

    fn draw_image_in_circle(
        &mut self,
        image: &HtmlImageElement,
        center: Point,
        clip_radius: f64,
        size: f64,
    ) -> Result<(), RenderError> {
        self.ctx.save();
        self.ctx.begin_path();
        let drawn = self
            .ctx
            .arc(center.x, center.y, clip_radius.max(0.0), 0.0, 2.0 * PI)
            .and_then(|()| {
                self.ctx.clip();
                self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    center.x - size / 2.0,
                    center.y - size / 2.0,
                    size,
                    size,
                )
            });
        self.ctx.restore();
        drawn.map_err(RenderError::from)
    }
}
