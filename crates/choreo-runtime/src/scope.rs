#![forbid(unsafe_code)]

//! The scoped animate function handed to intent callbacks.
//!
//! [`AnimateScope`] composes target resolution with the engine invocation
//! and threads the owning run through both: before any call reaches the
//! engine the run's cancellation token is checked, and every handle the
//! engine returns is tracked on the run for stop-on-cancel. The handle is
//! returned unchanged so callbacks can await, compose, or inspect it.

use std::rc::Rc;
use std::time::Duration;

use choreo_core::{
    Call, Element, Engine, Keyframes, Options, PlaybackHandle, Request, Sequence, Target,
};

use crate::error::AnimateError;
use crate::resolve::resolve_request;
use crate::run::Run;

struct ScopeInner {
    engine: Rc<dyn Engine>,
    owned: Element,
    run: Run,
}

/// Scoped animate function: issue calls against the engine on behalf of one
/// run. Cloning shares the scope; clones stay bound to the same run.
#[derive(Clone)]
pub struct AnimateScope {
    inner: Rc<ScopeInner>,
}

impl AnimateScope {
    pub(crate) fn new(engine: Rc<dyn Engine>, owned: Element, run: Run) -> Self {
        Self {
            inner: Rc::new(ScopeInner { engine, owned, run }),
        }
    }

    /// The element this scope's controller owns.
    #[must_use]
    pub fn owned(&self) -> &Element {
        &self.inner.owned
    }

    /// Issue one animation call.
    ///
    /// Fails with [`AnimateError::Cancelled`] — without touching the engine —
    /// if the owning run has been cancelled.
    pub fn animate(
        &self,
        target: impl Into<Target>,
        keyframes: Keyframes,
        options: Options,
    ) -> Result<PlaybackHandle, AnimateError> {
        self.submit(Request::Single(Call::new(target, keyframes, options)))
    }

    /// Issue a whole sequence as one engine call.
    pub fn animate_sequence(&self, seq: Sequence) -> Result<PlaybackHandle, AnimateError> {
        self.submit(Request::Sequence(seq))
    }

    /// A pure pause: an empty-keyframe call against the owned element,
    /// settling once the engine clock passes `duration`.
    pub fn delay(&self, duration: Duration) -> Result<PlaybackHandle, AnimateError> {
        self.animate(
            Target::Owned,
            Keyframes::new(),
            Options::new().duration(duration),
        )
    }

    fn submit(&self, request: Request) -> Result<PlaybackHandle, AnimateError> {
        if self.inner.run.is_cancelled() {
            return Err(AnimateError::Cancelled);
        }
        let request = resolve_request(request, &self.inner.owned);
        let handle = self.inner.engine.animate(request)?;
        self.inner.run.track(handle.clone());
        Ok(handle)
    }
}

impl std::fmt::Debug for AnimateScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimateScope")
            .field("owned", &self.inner.owned)
            .field("run", &self.inner.run)
            .finish()
    }
}
