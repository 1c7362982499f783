//! Input model: interaction modes, the selection set, and the drag state machine.
//!
//! `Mode` captures what the toolbar says a click should do. `Selection` is the
//! set of selected element and relationship ids that drives the highlight and
//! the host's detail panels. `InputState` is the active gesture between
//! pointer-down and pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::BTreeSet;

use crate::geometry::Point;
use crate::scene::ElementId;

/// What a pointer-down on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Select and drag (default).
    #[default]
    Select,
    /// The host's eraser is active; the canvas ignores presses and drags.
    Erase,
    /// Clicks pick the source and then the target of a new relationship.
    Relationship,
}

/// Currently selected element and relationship ids. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ElementId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.ids.iter()
    }

    /// Replace the selection with just `id`. Returns `true` if anything changed.
    pub fn select_only(&mut self, id: ElementId) -> bool {
        if self.ids.len() == 1 && self.ids.contains(&id) {
            return false;
        }
        self.ids.clear();
        self.ids.insert(id);
        true
    }

    /// Add `id` to the selection. Returns `true` if it was not already selected.
    pub fn insert(&mut self, id: ElementId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &ElementId) -> bool {
        self.ids.remove(id)
    }

    /// Empty the selection. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.ids.is_empty();
        self.ids.clear();
        had_any
    }
}

impl FromIterator<ElementId> for Selection {
    fn from_iter<T: IntoIterator<Item = ElementId>>(iter: T) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

/// Persistent UI state visible to the renderer and the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub mode: Mode,
    /// View-only canvas: selection works, nothing moves.
    pub read_only: bool,
    pub selection: Selection,
    /// Source picked by the first click in relationship mode.
    pub pending_source: Option<ElementId>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving one or more elements across the canvas.
    Dragging {
        /// Diagram-space position of the pointer at the previous event.
        last_world: Point,
        /// Elements moved by this drag.
        ids: Vec<ElementId>,
    },
}

impl InputState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
