#![forbid(unsafe_code)]

//! Intent runners: one per active intent, restarted on dependency change.
//!
//! # State machine
//!
//! `Idle -> Running -> { Completed | Cancelled | Failed }`, re-entering
//! `Running` on every [`restart`](IntentRunner::restart).
//!
//! # Ordering
//!
//! A restart fully cancels the previous run — flag set, every tracked handle
//! stopped — before the new run's future is even constructed, so two runs of
//! the same intent can never race on the owned element. At most one
//! non-cancelled run exists per runner at any instant.
//!
//! Errors from an intent's procedure leave the runner `Failed` and are
//! reported through `tracing`; the runner never retries.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawnExt, SpawnError};
use tracing::{debug, error};

use crate::error::AnimateError;
use crate::run::{Run, RunState};

/// Observable state of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// No run has been started yet.
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

struct RunnerInner {
    label: &'static str,
    spawner: futures::executor::LocalSpawner,
    current: RefCell<Option<Run>>,
}

/// Drives one intent: starts runs, restarts them on dependency change, and
/// guarantees cancel-before-restart ordering. Cloning shares the runner.
#[derive(Clone)]
pub struct IntentRunner {
    inner: Rc<RunnerInner>,
}

impl IntentRunner {
    #[must_use]
    pub fn new(label: &'static str, spawner: futures::executor::LocalSpawner) -> Self {
        Self {
            inner: Rc::new(RunnerInner {
                label,
                spawner,
                current: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        match self.inner.current.borrow().as_ref().map(Run::state) {
            None => RunnerState::Idle,
            Some(RunState::Running) => RunnerState::Running,
            Some(RunState::Completed) => RunnerState::Completed,
            Some(RunState::Cancelled) => RunnerState::Cancelled,
            Some(RunState::Failed) => RunnerState::Failed,
        }
    }

    /// The current run, if any. Mostly useful to assert on in tests.
    #[must_use]
    pub fn current(&self) -> Option<Run> {
        self.inner.current.borrow().clone()
    }

    /// Cancel the previous run (if any), then start a fresh one executing
    /// the future `factory` builds for it.
    ///
    /// The factory runs after the old run is fully cancelled and receives
    /// the new run, typically to build an
    /// [`AnimateScope`](crate::AnimateScope) around it.
    pub fn restart(
        &self,
        factory: impl FnOnce(Run) -> LocalBoxFuture<'static, Result<(), AnimateError>>,
    ) {
        self.cancel();

        let run = Run::new(self.inner.label);
        *self.inner.current.borrow_mut() = Some(run.clone());
        debug!(target: "choreo.runner", intent = self.inner.label, "run started");

        let fut = factory(run.clone());
        let label = self.inner.label;
        let task = async move {
            let result = fut.await;
            run.settle(&result);
            match &result {
                Ok(()) => debug!(target: "choreo.runner", intent = label, "run completed"),
                Err(e) if e.is_cancelled() => {
                    debug!(target: "choreo.runner", intent = label, "run observed cancellation");
                }
                Err(e) => {
                    error!(target: "choreo.runner", intent = label, error = %e, "run failed");
                }
            }
        };
        if let Err(e) = self.spawn(task) {
            debug!(target: "choreo.runner", intent = label, ?e, "spawn rejected, executor gone");
        }
    }

    /// Cancel the current run: flag first, then stop every tracked handle.
    /// No-op when idle or already cancelled.
    pub fn cancel(&self) {
        if let Some(run) = self.inner.current.borrow().as_ref() {
            run.cancel();
        }
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + 'static) -> Result<(), SpawnError> {
        self.inner.spawner.spawn_local(task)
    }
}

impl std::fmt::Debug for IntentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRunner")
            .field("intent", &self.inner.label)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_core::{EngineError, PlaybackHandle};
    use futures::FutureExt;
    use futures::executor::LocalPool;

    fn pool_and_runner(label: &'static str) -> (LocalPool, IntentRunner) {
        let pool = LocalPool::new();
        let runner = IntentRunner::new(label, pool.spawner());
        (pool, runner)
    }

    #[test]
    fn starts_idle() {
        let (_pool, runner) = pool_and_runner("t");
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.current().is_none());
    }

    #[test]
    fn completes_after_drive() {
        let (mut pool, runner) = pool_and_runner("t");
        runner.restart(|_run| async { Ok(()) }.boxed_local());
        assert_eq!(runner.state(), RunnerState::Running);
        pool.run_until_stalled();
        assert_eq!(runner.state(), RunnerState::Completed);
    }

    #[test]
    fn restart_cancels_the_old_run_before_building_the_new() {
        let (mut pool, runner) = pool_and_runner("t");
        runner.restart(|_run| async { Ok(()) }.boxed_local());
        let first = runner.current().unwrap();
        let (h, _ctl) = PlaybackHandle::pending();
        first.track(h.clone());

        runner.restart({
            let first = first.clone();
            let h = h.clone();
            move |_new| {
                // By the time the new run's future is built, the old run is
                // fully cancelled and its handles stopped.
                assert!(first.is_cancelled());
                assert!(h.is_stopped());
                async { Ok(()) }.boxed_local()
            }
        });
        pool.run_until_stalled();
        assert_eq!(runner.state(), RunnerState::Completed);
        assert_eq!(first.state(), RunState::Cancelled);
    }

    #[test]
    fn at_most_one_non_cancelled_run() {
        let (_pool, runner) = pool_and_runner("t");
        runner.restart(|_run| futures::future::pending().boxed_local());
        let first = runner.current().unwrap();
        runner.restart(|_run| futures::future::pending().boxed_local());
        let second = runner.current().unwrap();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn failure_is_terminal_and_not_retried() {
        let (mut pool, runner) = pool_and_runner("t");
        runner.restart(|_run| {
            async { Err(AnimateError::Engine(EngineError::EmptyRequest)) }.boxed_local()
        });
        pool.run_until_stalled();
        assert_eq!(runner.state(), RunnerState::Failed);
        pool.run_until_stalled();
        assert_eq!(runner.state(), RunnerState::Failed);
    }

    #[test]
    fn cancelled_error_is_not_a_failure() {
        let (mut pool, runner) = pool_and_runner("t");
        runner.restart(|run| {
            async move {
                run.cancel();
                Err(AnimateError::Cancelled)
            }
            .boxed_local()
        });
        pool.run_until_stalled();
        assert_eq!(runner.state(), RunnerState::Cancelled);
    }

    #[test]
    fn cancel_when_idle_is_a_noop() {
        let (_pool, runner) = pool_and_runner("t");
        runner.cancel();
        assert_eq!(runner.state(), RunnerState::Idle);
    }
}
