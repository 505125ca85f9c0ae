#![forbid(unsafe_code)]

//! Presence: externally-tracked logical existence of an element.
//!
//! [`PresenceCell`] is the mount-negotiation surface between the host tree
//! and a controller. The host flips it to `Exiting` when the element is
//! logically removed, supplying a one-shot confirm callback; the controller
//! invokes [`confirm_removal`](PresenceCell::confirm_removal) once its exit
//! intent has resolved, and the host performs the actual removal then.
//!
//! Presence is monotonic for an element instance: `Present -> Exiting`, no
//! way back. A second `begin_exit` is a protocol violation and is rejected.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::error::AnimateError;

/// Logical existence of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Exiting,
}

impl Presence {
    #[must_use]
    pub fn is_present(self) -> bool {
        self == Presence::Present
    }
}

struct PresenceInner {
    state: Cell<Presence>,
    confirm: RefCell<Option<Box<dyn FnOnce()>>>,
    confirmed: Cell<bool>,
}

/// Shared presence signal for one element instance. Cloning shares the cell.
#[derive(Clone)]
pub struct PresenceCell {
    inner: Rc<PresenceInner>,
}

impl PresenceCell {
    /// A cell that starts `Present` — the state of a freshly mounted element.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(PresenceInner {
                state: Cell::new(Presence::Present),
                confirm: RefCell::new(None),
                confirmed: Cell::new(false),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> Presence {
        self.inner.state.get()
    }

    /// Host side: the element is logically removed. `confirm` runs exactly
    /// once, when (and if) the controller confirms removal.
    ///
    /// Fails if the cell is already `Exiting`.
    pub fn begin_exit(&self, confirm: impl FnOnce() + 'static) -> Result<(), AnimateError> {
        if self.inner.state.get() == Presence::Exiting {
            return Err(AnimateError::PresenceViolation(
                "begin_exit on an already-exiting element",
            ));
        }
        self.inner.state.set(Presence::Exiting);
        *self.inner.confirm.borrow_mut() = Some(Box::new(confirm));
        debug!(target: "choreo.presence", "element exiting");
        Ok(())
    }

    /// Controller side: the exit intent resolved; fire the host's confirm
    /// callback. The callback runs at most once; later calls are no-ops.
    pub fn confirm_removal(&self) {
        if self.inner.confirmed.replace(true) {
            debug!(target: "choreo.presence", "removal already confirmed, ignoring");
            return;
        }
        if let Some(confirm) = self.inner.confirm.borrow_mut().take() {
            confirm();
        }
    }

    /// Whether `confirm_removal` has fired.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.inner.confirmed.get()
    }
}

impl Default for PresenceCell {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PresenceCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceCell")
            .field("state", &self.inner.state.get())
            .field("confirmed", &self.inner.confirmed.get())
            .finish()
    }
}
