//! Top-level engine: pointer handling, selection, drag, and render driving.
//!
//! [`EngineCore`] holds all state and logic that does not touch the browser,
//! so it can be tested natively. [`Engine`] wraps it together with the
//! `<canvas>` surface and the portrait loader.
//!
//! Input handlers return a list of [`Action`]s. The host forwards them to its
//! panels (selection, relationship creation) and persistence layer (element
//! updates), and redraws when asked.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use futures::future::{AbortHandle, abortable};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::config::{ConfigError, EngineConfig};
use crate::geometry::Point;
use crate::hit::{self, Hit};
use crate::images::{PortraitInbox, PortraitLoaded, PortraitRequest, Portraits};
use crate::input::{InputState, Mode, Selection, UiState};
use crate::overlay;
use crate::project::ProjectDocument;
use crate::render::{self, CanvasSurface, DrawContext, RenderError};
use crate::scene::{Element, ElementId, PartialElement, Relationship, RelationshipDetail, SceneModel, ValidRelationship};
use crate::view::ViewTransform;

/// Error returned when an engine cannot be constructed.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What the selection notifier is told after a press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Element(ElementId),
    Relationship(ElementId),
    None,
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectionChanged(SelectionTarget),
    /// An element moved or was edited; persist `fields`.
    ElementUpdated { id: ElementId, fields: PartialElement },
    /// Relationship mode picked a source and then a distinct target.
    CreateRelationship { source_id: ElementId, target_id: ElementId },
    /// Any press on the canvas; hosts close open menus on this.
    CanvasPressed,
    SetCursor(String),
    RenderNeeded,
    /// A portrait finished loading and was drawn over its node.
    RepaintPortrait(ElementId),
}

/// Core engine state, independent of the canvas element.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub scene: SceneModel,
    pub view: ViewTransform,
    pub ui: UiState,
    pub input: InputState,
    pub config: EngineConfig,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine using `config`.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`EngineConfig::validate`].
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { view: ViewTransform::new(1.0, &config), config, ..Self::default() })
    }

    /// A read-only engine showing a loaded project.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`EngineConfig::validate`].
    pub fn for_project(project: ProjectDocument, config: EngineConfig) -> Result<Self, ConfigError> {
        let mut core = Self::with_config(config)?;
        core.load(project.scene);
        core.ui.read_only = true;
        Ok(core)
    }

    // --- Data inputs ---

    /// Replace the diagram. Selection and any gesture in progress are reset.
    pub fn load(&mut self, scene: SceneModel) {
        self.scene = scene;
        self.ui.selection.clear();
        self.ui.pending_source = None;
        self.input = InputState::Idle;
    }

    pub fn insert_element(&mut self, element: Element) -> Vec<Action> {
        if self.scene.insert_element(element) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn insert_relationship(&mut self, relationship: Relationship) -> Vec<Action> {
        self.scene.insert_relationship(relationship);
        vec![Action::RenderNeeded]
    }

    /// Remove an element or relationship and forget it everywhere.
    pub fn remove(&mut self, id: &ElementId) -> Vec<Action> {
        if !self.scene.remove(id) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.ui.selection.remove(id) {
            actions.push(Action::SelectionChanged(self.selection_target()));
        }
        if self.ui.pending_source.as_ref() == Some(id) {
            self.ui.pending_source = None;
        }
        if let InputState::Dragging { ids, .. } = &mut self.input {
            ids.retain(|dragged| dragged != id);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Merge `fields` into an element or relationship. Ignored when read-only
    /// or when `id` is unknown.
    pub fn update_element(&mut self, id: &ElementId, fields: PartialElement) -> Vec<Action> {
        if self.ui.read_only || !self.scene.update_element(id, &fields) {
            return Vec::new();
        }
        vec![Action::ElementUpdated { id: id.clone(), fields }, Action::RenderNeeded]
    }

    /// Commit text from the inline label editor of a relationship.
    pub fn set_relationship_text(&mut self, id: &ElementId, text: impl Into<String>) -> Vec<Action> {
        if self.scene.relationship(id).is_none() {
            log::debug!("label edit for unknown relationship {id} ignored");
            return Vec::new();
        }
        self.update_element(id, PartialElement::text(text))
    }

    // --- Modes and zoom ---

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != Mode::Relationship {
            self.ui.pending_source = None;
        }
        self.ui.mode = mode;
        self.input = InputState::Idle;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.ui.read_only = read_only;
        if read_only {
            self.input = InputState::Idle;
        }
    }

    pub fn zoom_in(&mut self) -> Action {
        self.view.zoom_in(&self.config);
        Action::RenderNeeded
    }

    pub fn zoom_out(&mut self) -> Action {
        self.view.zoom_out(&self.config);
        Action::RenderNeeded
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Action {
        self.view.set_zoom(zoom, &self.config);
        Action::RenderNeeded
    }

    // --- Input events ---

    /// Pointer pressed at `pixel` (relative to the canvas origin).
    pub fn on_pointer_down(&mut self, pixel: Point) -> Vec<Action> {
        if self.ui.mode == Mode::Erase {
            return Vec::new();
        }

        let mut actions = Vec::new();
        match hit::hit_test(&self.scene, pixel, &self.view, &self.config) {
            Some(Hit::Relationship(id)) => {
                self.ui.pending_source = None;
                if self.ui.selection.select_only(id.clone()) {
                    actions.push(Action::RenderNeeded);
                }
                actions.push(Action::SelectionChanged(SelectionTarget::Relationship(id)));
            }
            Some(Hit::Element(id)) if self.ui.mode == Mode::Relationship => {
                self.pick_endpoint(id, &mut actions);
            }
            Some(Hit::Element(id)) => {
                self.press_element(id, self.view.to_diagram(pixel), &mut actions);
            }
            None => {
                self.ui.pending_source = None;
                if self.ui.selection.clear() {
                    actions.push(Action::RenderNeeded);
                }
                actions.push(Action::SelectionChanged(SelectionTarget::None));
            }
        }
        actions.push(Action::CanvasPressed);
        actions
    }

    fn press_element(&mut self, id: ElementId, world: Point, actions: &mut Vec<Action>) {
        let ids = if self.ui.selection.contains(&id) {
            self.ui.selection.iter().filter(|sel| self.scene.element(sel).is_some()).cloned().collect()
        } else {
            self.ui.selection.select_only(id.clone());
            actions.push(Action::SelectionChanged(SelectionTarget::Element(id.clone())));
            actions.push(Action::RenderNeeded);
            vec![id]
        };

        if self.ui.read_only {
            return;
        }
        log::debug!("drag start: {} element(s)", ids.len());
        self.input = InputState::Dragging { last_world: world, ids };
        actions.push(Action::SetCursor("grabbing".into()));
    }

    fn pick_endpoint(&mut self, id: ElementId, actions: &mut Vec<Action>) {
        match self.ui.pending_source.take() {
            Some(source) if source != id => {
                if self.ui.read_only {
                    log::debug!("relationship creation suppressed in read-only mode");
                } else {
                    actions.push(Action::CreateRelationship { source_id: source, target_id: id.clone() });
                }
            }
            _ => self.ui.pending_source = Some(id.clone()),
        }
        if self.ui.selection.select_only(id.clone()) {
            actions.push(Action::RenderNeeded);
        }
        actions.push(Action::SelectionChanged(SelectionTarget::Element(id)));
    }

    /// Pointer moved to `pixel`. Only does anything while dragging.
    pub fn on_pointer_move(&mut self, pixel: Point) -> Vec<Action> {
        if self.ui.mode != Mode::Select || self.ui.read_only {
            return Vec::new();
        }
        let InputState::Dragging { last_world, ids } = &mut self.input else {
            return Vec::new();
        };

        let world = self.view.to_diagram(pixel);
        let dx = world.x - last_world.x;
        let dy = world.y - last_world.y;
        *last_world = world;

        let mut actions = Vec::new();
        for id in ids.iter() {
            let Some(el) = self.scene.element(id) else {
                continue;
            };
            let fields = PartialElement::position(el.x + dx, el.y + dy);
            if self.scene.update_element(id, &fields) {
                actions.push(Action::ElementUpdated { id: id.clone(), fields });
            }
        }
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Pointer released. Ends any drag; moves already applied stay applied.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.end_drag()
    }

    /// Pointer left the canvas. Same as a release.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.end_drag()
    }

    fn end_drag(&mut self) -> Vec<Action> {
        if !self.input.is_dragging() {
            return Vec::new();
        }
        log::debug!("drag end");
        self.input = InputState::Idle;
        vec![Action::SetCursor("default".into())]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.ui.selection
    }

    /// The selection as reported to the host: the single selected element or
    /// relationship, else none.
    #[must_use]
    pub fn selection_target(&self) -> SelectionTarget {
        let mut ids = self.ui.selection.iter();
        match (ids.next(), ids.next()) {
            (Some(id), None) if self.scene.relationship(id).is_some() => SelectionTarget::Relationship(id.clone()),
            (Some(id), None) if self.scene.element(id).is_some() => SelectionTarget::Element(id.clone()),
            _ => SelectionTarget::None,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.scene.element(id)
    }

    #[must_use]
    pub fn valid_relationships(&self) -> Vec<ValidRelationship<'_>> {
        self.scene.valid_relationships()
    }

    #[must_use]
    pub fn connected_relationships(&self, id: &ElementId) -> Vec<&Relationship> {
        self.scene.connected_relationships(id)
    }

    #[must_use]
    pub fn relationship_detail(&self, id: &ElementId) -> Option<RelationshipDetail<'_>> {
        self.scene.relationship_detail(id)
    }

    /// SVG markup for the relationship overlay.
    #[must_use]
    pub fn overlay_markup(&self) -> String {
        overlay::render_overlay(&self.scene.valid_relationships(), &self.ui.selection, &self.view, &self.config)
    }
}

/// Install the browser console as the `log` backend.
pub fn init_logging(level: log::Level) {
    if let Err(e) = console_log::init_with_level(level) {
        log::debug!("logger already installed: {e}");
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas.
pub struct Engine {
    surface: CanvasSurface,
    pub core: EngineCore,
    portraits: Portraits<HtmlImageElement>,
    inbox: PortraitInbox<HtmlImageElement>,
}

impl Engine {
    /// Create an engine drawing into `canvas`.
    ///
    /// `on_portrait` runs each time a portrait load finishes, with the id of
    /// its node. The host should respond by calling [`Engine::pump_portraits`],
    /// which repaints just that node.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid config and
    /// [`EngineError::Render`] when the canvas has no 2D context.
    pub fn new(
        canvas: HtmlCanvasElement,
        config: EngineConfig,
        on_portrait: impl Fn(&ElementId) + 'static,
    ) -> Result<Self, EngineError> {
        let core = EngineCore::with_config(config)?;
        let ctx = canvas
            .get_context("2d")
            .map_err(RenderError::from)?
            .ok_or_else(|| RenderError::Surface("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Surface("2d context has unexpected type".into()))?;
        Ok(Self {
            surface: CanvasSurface::new(canvas, ctx),
            core,
            portraits: Portraits::new(),
            inbox: PortraitInbox::new(on_portrait),
        })
    }

    // --- Delegated inputs ---

    pub fn load(&mut self, scene: SceneModel) {
        self.core.load(scene);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.core.set_mode(mode);
    }

    pub fn on_pointer_down(&mut self, pixel: Point) -> Vec<Action> {
        self.core.on_pointer_down(pixel)
    }

    pub fn on_pointer_move(&mut self, pixel: Point) -> Vec<Action> {
        self.core.on_pointer_move(pixel)
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.core.on_pointer_up()
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.on_pointer_leave()
    }

    // --- Render ---

    /// Draw the raster layer and return the overlay markup for the host to
    /// place above it. Starts loads for any portraits not yet requested.
    ///
    /// # Errors
    ///
    /// Returns the first [`RenderError`] raised by the canvas.
    pub fn render(&mut self) -> Result<String, RenderError> {
        self.request_portraits();
        let cx = DrawContext {
            scene: &self.core.scene,
            selection: &self.core.ui.selection,
            view: &self.core.view,
            config: &self.core.config,
            portraits: &self.portraits,
        };
        render::draw_scene(&mut self.surface, &cx)?;
        Ok(self.core.overlay_markup())
    }

    /// Apply finished portrait loads, repainting only the affected nodes.
    ///
    /// # Errors
    ///
    /// Returns the first [`RenderError`] raised while repainting.
    pub fn pump_portraits(&mut self) -> Result<Vec<Action>, RenderError> {
        let loaded = self.inbox.drain();
        let mut actions = Vec::new();
        for PortraitLoaded { id, generation, result } in loaded {
            let Some(id) = self.portraits.complete(&id, generation, result) else {
                continue;
            };
            let cx = DrawContext {
                scene: &self.core.scene,
                selection: &self.core.ui.selection,
                view: &self.core.view,
                config: &self.core.config,
                portraits: &self.portraits,
            };
            render::repaint_portrait(&mut self.surface, &cx, &id)?;
            actions.push(Action::RepaintPortrait(id));
        }
        Ok(actions)
    }

    fn request_portraits(&mut self) {
        for req in self.portraits.sync(&self.core.scene) {
            match spawn_portrait_load(&req, self.inbox.clone()) {
                Ok(handle) => self.portraits.attach_abort(&req.id, req.generation, handle),
                Err(e) => {
                    self.portraits.complete(&req.id, req.generation, Err(e));
                }
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.portraits.cancel_all();
    }
}

fn spawn_portrait_load(
    req: &PortraitRequest,
    inbox: PortraitInbox<HtmlImageElement>,
) -> Result<AbortHandle, String> {
    let image = HtmlImageElement::new().map_err(|e| format!("{e:?}"))?;
    image.set_src(&req.url);
    let decode = JsFuture::from(image.decode());

    let id = req.id.clone();
    let generation = req.generation;
    let (task, handle) = abortable(async move {
        let result = decode.await.map(|_| image).map_err(|e| format!("{e:?}"));
        inbox.post(PortraitLoaded { id, generation, result });
    });

    log::debug!("loading portrait for {} from {}", req.id, req.url);
    wasm_bindgen_futures::spawn_local(async move {
        if task.await.is_err() {
            log::debug!("portrait load aborted");
        }
    });
    Ok(handle)
}
