//! Portrait image bookkeeping keyed by node id.
//!
//! Loading itself happens outside this module (the wasm [`crate::engine::Engine`]
//! spawns one decode task per [`PortraitRequest`]). Here we only track which
//! URL each circle wants, which load is current, and what came back. Every
//! request carries a generation number; a completion whose generation no
//! longer matches its slot is stale and dropped, so a slow image for an old
//! URL can never overwrite a newer one.
//!
//! Finished loads are posted to a [`PortraitInbox`], which wakes the host
//! through its notifier so the node can be repainted without waiting for
//! another pointer event.

#[cfg(test)]
#[path = "images_test.rs"]
mod images_test;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use futures::future::AbortHandle;

use crate::scene::{ElementId, ElementKind, SceneModel};

/// A portrait that needs loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitRequest {
    pub id: ElementId,
    pub url: String,
    pub generation: u64,
}

/// Load state of one node's portrait.
#[derive(Debug, Clone, PartialEq)]
pub enum PortraitState<I> {
    Pending,
    Ready(I),
    /// The image could not be loaded; the node is drawn without it.
    Failed,
}

#[derive(Debug)]
struct Slot<I> {
    url: String,
    generation: u64,
    state: PortraitState<I>,
    abort: Option<AbortHandle>,
}

impl<I> Slot<I> {
    fn cancel(&mut self) {
        if let Some(handle) = self.abort.take() {
            handle.abort();
        }
    }
}

/// Portrait slots for every circle that has a profile image.
#[derive(Debug)]
pub struct Portraits<I> {
    slots: HashMap<ElementId, Slot<I>>,
    next_generation: u64,
}

impl<I> Default for Portraits<I> {
    fn default() -> Self {
        Self { slots: HashMap::new(), next_generation: 1 }
    }
}

impl<I> Portraits<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile slots with the circles in `scene`.
    ///
    /// Returns one request per circle whose portrait URL is new or changed.
    /// Slots for removed circles, cleared URLs and replaced URLs are dropped
    /// and their in-flight loads aborted.
    pub fn sync(&mut self, scene: &SceneModel) -> Vec<PortraitRequest> {
        let mut wanted = HashSet::new();
        let mut requests = Vec::new();

        for el in scene.elements().filter(|el| el.kind == ElementKind::Circle) {
            let Some(url) = el.profile_image.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            wanted.insert(el.id.clone());

            if let Some(slot) = self.slots.get_mut(&el.id) {
                if slot.url == url {
                    continue;
                }
                slot.cancel();
            }

            let generation = self.next_generation;
            self.next_generation += 1;
            self.slots.insert(
                el.id.clone(),
                Slot { url: url.to_owned(), generation, state: PortraitState::Pending, abort: None },
            );
            requests.push(PortraitRequest { id: el.id.clone(), url: url.to_owned(), generation });
        }

        self.slots.retain(|id, slot| {
            let keep = wanted.contains(id);
            if !keep {
                log::debug!("dropping portrait for {id}");
                slot.cancel();
            }
            keep
        });

        requests
    }

    /// Remember how to cancel the load for `id`. A handle for a load that is
    /// already stale is aborted on the spot.
    pub fn attach_abort(&mut self, id: &ElementId, generation: u64, handle: AbortHandle) {
        match self.slots.get_mut(id) {
            Some(slot) if slot.generation == generation => slot.abort = Some(handle),
            _ => handle.abort(),
        }
    }

    /// Record the outcome of a load.
    ///
    /// Returns the node to repaint when a current load succeeded. Stale
    /// completions change nothing; failures mark the slot failed.
    pub fn complete(&mut self, id: &ElementId, generation: u64, result: Result<I, String>) -> Option<ElementId> {
        let Some(slot) = self.slots.get_mut(id).filter(|slot| slot.generation == generation) else {
            log::debug!("ignoring stale portrait for {id} (generation {generation})");
            return None;
        };
        slot.abort = None;
        match result {
            Ok(image) => {
                slot.state = PortraitState::Ready(image);
                Some(id.clone())
            }
            Err(e) => {
                log::warn!("portrait for {id} failed to load from {}: {e}", slot.url);
                slot.state = PortraitState::Failed;
                None
            }
        }
    }

    /// The loaded image for `id`, if it is ready.
    #[must_use]
    pub fn image(&self, id: &ElementId) -> Option<&I> {
        match self.slots.get(id).map(|slot| &slot.state) {
            Some(PortraitState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self, id: &ElementId) -> Option<&PortraitState<I>> {
        self.slots.get(id).map(|slot| &slot.state)
    }

    /// Abort every in-flight load and forget all slots.
    pub fn cancel_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.cancel();
        }
        self.slots.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A finished load, waiting to be applied with [`Portraits::complete`].
#[derive(Debug)]
pub struct PortraitLoaded<I> {
    pub id: ElementId,
    pub generation: u64,
    pub result: Result<I, String>,
}

/// Mailbox shared between load tasks and the engine.
///
/// Clones share the same queue and notifier.
pub struct PortraitInbox<I> {
    loaded: Rc<RefCell<Vec<PortraitLoaded<I>>>>,
    notify: Rc<dyn Fn(&ElementId)>,
}

impl<I> Clone for PortraitInbox<I> {
    fn clone(&self) -> Self {
        Self { loaded: Rc::clone(&self.loaded), notify: Rc::clone(&self.notify) }
    }
}

impl<I> PortraitInbox<I> {
    /// An empty inbox that calls `notify` with the node id after each post.
    pub fn new(notify: impl Fn(&ElementId) + 'static) -> Self {
        Self { loaded: Rc::default(), notify: Rc::new(notify) }
    }

    /// Queue a finished load and wake the host. The queue is released before
    /// `notify` runs, so the notifier may drain it.
    pub fn post(&self, loaded: PortraitLoaded<I>) {
        let id = loaded.id.clone();
        self.loaded.borrow_mut().push(loaded);
        (self.notify)(&id);
    }

    /// Take everything queued so far.
    #[must_use]
    pub fn drain(&self) -> Vec<PortraitLoaded<I>> {
        std::mem::take(&mut *self.loaded.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loaded.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.borrow().is_empty()
    }
}
