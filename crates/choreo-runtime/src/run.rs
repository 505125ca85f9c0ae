#![forbid(unsafe_code)]

//! Runs: one cancellable execution of an intent.
//!
//! A [`Run`] owns the cancellation flag and the ordered collection of every
//! [`PlaybackHandle`] issued under it. The collection lives on the run, not
//! in ambient state, so controllers never interfere with each other and
//! teardown is testable in isolation.
//!
//! # Invariants
//!
//! 1. `cancel()` sets the flag before stopping any handle; since everything
//!    is single-threaded, no handle can be tracked between the flag-set and
//!    the stop loop. No handle issued under a cancelled run is left playing.
//! 2. `cancel()` is idempotent.
//! 3. A run's terminal state is written once: `settle()` after `cancel()`
//!    leaves the run `Cancelled`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use choreo_core::PlaybackHandle;
use tracing::debug;

use crate::cancellation::{CancelSource, CancelToken};
use crate::error::AnimateError;

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The intent's procedure is in flight.
    Running,
    /// The procedure resolved without error.
    Completed,
    /// The run was cancelled before the procedure resolved.
    Cancelled,
    /// The procedure surfaced an error; the runner does not retry.
    Failed,
}

struct RunInner {
    label: &'static str,
    source: CancelSource,
    handles: RefCell<Vec<PlaybackHandle>>,
    state: Cell<RunState>,
}

/// One cancellable execution of an intent's procedure. Cloning shares the run.
#[derive(Clone)]
pub struct Run {
    inner: Rc<RunInner>,
}

impl Run {
    /// Start a new run in the `Running` state.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            inner: Rc::new(RunInner {
                label,
                source: CancelSource::new(),
                handles: RefCell::new(Vec::new()),
                state: Cell::new(RunState::Running),
            }),
        }
    }

    /// Intent label, for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.inner.state.get()
    }

    /// Token the scoped animate function checks before each call.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.inner.source.token()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.source.is_cancelled()
    }

    /// Record a handle issued under this run, in issue order.
    pub fn track(&self, handle: PlaybackHandle) {
        self.inner.handles.borrow_mut().push(handle);
    }

    /// Number of handles tracked so far.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.inner.handles.borrow().len()
    }

    /// Cancel the run: set the flag, then stop every tracked handle in
    /// issue order. Re-entrant safe.
    pub fn cancel(&self) {
        if self.inner.source.is_cancelled() {
            return;
        }
        self.inner.source.cancel();
        self.inner.state.set(RunState::Cancelled);
        let handles = self.inner.handles.borrow();
        for handle in handles.iter() {
            handle.stop();
        }
        debug!(
            target: "choreo.run",
            intent = self.inner.label,
            stopped = handles.len(),
            "run cancelled"
        );
    }

    /// Record the procedure's terminal result. A cancelled run stays
    /// `Cancelled` regardless of how the in-flight procedure wound down.
    pub fn settle(&self, result: &Result<(), AnimateError>) {
        if self.is_cancelled() {
            return;
        }
        let state = match result {
            Ok(()) => RunState::Completed,
            Err(e) if e.is_cancelled() => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };
        self.inner.state.set(state);
    }
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("intent", &self.inner.label)
            .field("state", &self.inner.state.get())
            .field("tracked", &self.inner.handles.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_core::EngineError;

    #[test]
    fn new_run_is_running() {
        let run = Run::new("test");
        assert_eq!(run.state(), RunState::Running);
        assert!(!run.is_cancelled());
    }

    #[test]
    fn cancel_stops_every_tracked_handle() {
        let run = Run::new("test");
        let (h1, _c1) = PlaybackHandle::pending();
        let (h2, _c2) = PlaybackHandle::pending();
        run.track(h1.clone());
        run.track(h2.clone());

        run.cancel();
        assert!(h1.is_stopped());
        assert!(h2.is_stopped());
        assert_eq!(run.state(), RunState::Cancelled);
    }

    #[test]
    fn cancel_is_reentrant_safe() {
        let run = Run::new("test");
        let (h, _c) = PlaybackHandle::pending();
        run.track(h);
        run.cancel();
        run.cancel();
        assert_eq!(run.state(), RunState::Cancelled);
    }

    #[test]
    fn cancel_leaves_finished_handles_finished() {
        let run = Run::new("test");
        let (h, ctl) = PlaybackHandle::pending();
        run.track(h.clone());
        ctl.finish();
        run.cancel();
        assert!(h.is_finished());
        assert!(!h.is_stopped());
    }

    #[test]
    fn settle_records_completion() {
        let run = Run::new("test");
        run.settle(&Ok(()));
        assert_eq!(run.state(), RunState::Completed);
    }

    #[test]
    fn settle_records_failure() {
        let run = Run::new("test");
        run.settle(&Err(AnimateError::Engine(EngineError::EmptyRequest)));
        assert_eq!(run.state(), RunState::Failed);
    }

    #[test]
    fn settle_after_cancel_stays_cancelled() {
        let run = Run::new("test");
        run.cancel();
        run.settle(&Ok(()));
        assert_eq!(run.state(), RunState::Cancelled);
    }

    #[test]
    fn cancelled_error_settles_as_cancelled_not_failed() {
        let run = Run::new("test");
        run.settle(&Err(AnimateError::Cancelled));
        assert_eq!(run.state(), RunState::Cancelled);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cancel_stops_all_pending_handles(n in 0usize..32) {
                let run = Run::new("prop");
                let handles: Vec<_> = (0..n)
                    .map(|_| {
                        let (h, _ctl) = PlaybackHandle::pending();
                        run.track(h.clone());
                        h
                    })
                    .collect();
                run.cancel();
                for h in &handles {
                    prop_assert!(h.is_stopped());
                }
            }
        }
    }
}
