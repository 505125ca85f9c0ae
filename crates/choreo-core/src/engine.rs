#![forbid(unsafe_code)]

//! The engine seam: the invocation primitive and playback handles.
//!
//! # How it works
//!
//! 1. A caller hands an [`Engine`] a fully-resolved [`Request`].
//! 2. The engine returns a [`PlaybackHandle`] immediately; playback proceeds
//!    on the engine's own schedule.
//! 3. The handle is both a control surface (`stop()`) and a suspension
//!    point: it implements `Future`, resolving with [`Playback::Finished`]
//!    when the engine completes it or [`Playback::Stopped`] when stopped.
//!
//! # Invariants
//!
//! 1. A handle settles at most once; `stop()` after settling is a no-op.
//! 2. Settling wakes any task awaiting the handle.
//! 3. Engines never see [`Target::Owned`](crate::Target::Owned) — resolution
//!    happens on the controller side, and an unresolved target is rejected
//!    with [`EngineError::UnresolvedTarget`].

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use thiserror::Error;

use crate::motion::Request;

/// Failures raised by an engine for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A placeholder target reached the engine unresolved.
    #[error("request contains an unresolved owned-element target")]
    UnresolvedTarget,
    /// The request names no calls at all.
    #[error("request contains no animation calls")]
    EmptyRequest,
}

/// How a playback settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Ran to its natural end.
    Finished,
    /// Stopped before completion.
    Stopped,
}

#[derive(Default)]
struct HandleShared {
    settled: Option<Playback>,
    waker: Option<Waker>,
}

impl HandleShared {
    fn settle(&mut self, outcome: Playback) -> bool {
        if self.settled.is_some() {
            return false;
        }
        self.settled = Some(outcome);
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
        true
    }
}

/// Opaque in-flight-animation token.
///
/// Cloning shares the underlying playback state: the controller tracks one
/// clone for stop-on-cancel while the issuing callback may await another.
#[derive(Clone, Default)]
pub struct PlaybackHandle {
    shared: Rc<RefCell<HandleShared>>,
}

impl PlaybackHandle {
    /// Create a pending handle plus the engine-side control for settling it.
    #[must_use]
    pub fn pending() -> (Self, HandleCtl) {
        let handle = Self::default();
        let ctl = HandleCtl {
            shared: Rc::clone(&handle.shared),
        };
        (handle, ctl)
    }

    /// Stop playback. Idempotent; no effect once settled.
    pub fn stop(&self) {
        self.shared.borrow_mut().settle(Playback::Stopped);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.borrow().settled == Some(Playback::Finished)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.borrow().settled == Some(Playback::Stopped)
    }

    /// Whether the handle has settled either way.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.borrow().settled.is_some()
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("settled", &self.shared.borrow().settled)
            .finish()
    }
}

impl Future for PlaybackHandle {
    type Output = Playback;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Playback> {
        let mut shared = self.shared.borrow_mut();
        match shared.settled {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Engine-side control for one handle.
pub struct HandleCtl {
    shared: Rc<RefCell<HandleShared>>,
}

impl HandleCtl {
    /// Mark playback finished. No effect if the handle was already stopped.
    pub fn finish(&self) {
        self.shared.borrow_mut().settle(Playback::Finished);
    }

    /// Whether the consumer stopped the handle.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.borrow().settled == Some(Playback::Stopped)
    }
}

/// The one invocation primitive a controller drives.
pub trait Engine {
    /// Begin playback for a resolved request.
    fn animate(&self, request: Request) -> Result<PlaybackHandle, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::Wake;

    struct CountingWaker(std::sync::atomic::AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: std::sync::Arc<Self>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn poll_once(handle: &mut PlaybackHandle) -> (Poll<Playback>, std::sync::Arc<CountingWaker>) {
        let wake = std::sync::Arc::new(CountingWaker(std::sync::atomic::AtomicUsize::new(0)));
        let waker = Waker::from(std::sync::Arc::clone(&wake));
        let mut cx = Context::from_waker(&waker);
        (Pin::new(handle).poll(&mut cx), wake)
    }

    #[test]
    fn pending_handle_is_unsettled() {
        let (handle, _ctl) = PlaybackHandle::pending();
        assert!(!handle.is_settled());
        assert!(!handle.is_finished());
        assert!(!handle.is_stopped());
    }

    #[test]
    fn finish_settles_and_wakes() {
        let (mut handle, ctl) = PlaybackHandle::pending();
        let (poll, wake) = poll_once(&mut handle);
        assert_eq!(poll, Poll::Pending);

        ctl.finish();
        assert_eq!(wake.0.load(std::sync::atomic::Ordering::SeqCst), 1);
        let (poll, _) = poll_once(&mut handle);
        assert_eq!(poll, Poll::Ready(Playback::Finished));
    }

    #[test]
    fn stop_wins_over_later_finish() {
        let (handle, ctl) = PlaybackHandle::pending();
        handle.stop();
        ctl.finish();
        assert!(handle.is_stopped());
        assert!(!handle.is_finished());
    }

    #[test]
    fn stop_is_idempotent() {
        let (handle, _ctl) = PlaybackHandle::pending();
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn clones_share_settlement() {
        let (handle, ctl) = PlaybackHandle::pending();
        let other = handle.clone();
        ctl.finish();
        assert!(other.is_finished());
    }

    #[test]
    fn ctl_observes_consumer_stop() {
        let (handle, ctl) = PlaybackHandle::pending();
        assert!(!ctl.is_stopped());
        handle.stop();
        assert!(ctl.is_stopped());
    }
}
