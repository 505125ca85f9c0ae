#![forbid(unsafe_code)]

//! Choreo Runtime
//!
//! The declarative animation lifecycle controller. Callers wrap one element
//! in an [`Animate`] controller, declare how it should move — an ad hoc
//! animator, a fixed sequence, an enter/exit pair, in any combination — and
//! the controller drives a single imperative [`Engine`](choreo_core::Engine)
//! while guaranteeing that superseded runs are cancelled, their playback
//! handles stopped, and exit animations finish before removal is confirmed
//! to the host.
//!
//! # Key Components
//!
//! - [`Animate`] / [`AnimateBuilder`] - the controller and its configuration
//! - [`AnimateScope`] - the scoped animate function handed to callbacks
//! - [`Run`] / [`IntentRunner`] - cancellable executions of one intent
//! - [`CancelSource`] / [`CancelToken`] - cooperative cancellation
//! - [`PresenceCell`] - mount negotiation: `Present -> Exiting -> confirmed`
//! - [`EffectSlot`] - dependency-scoped side effects with cleanup
//!
//! # Concurrency model
//!
//! Everything is single-threaded and cooperative: intent callbacks are
//! futures on a local executor, a suspension point is an awaited playback
//! handle, and cancellation is a flag checked before every call — never
//! preemption. See the `controller` module docs for the driving loop.

pub mod cancellation;
pub mod controller;
pub mod effect;
pub mod error;
pub mod presence;
pub mod resolve;
pub mod run;
pub mod runner;
pub mod scope;

pub use cancellation::{CancelSource, CancelToken};
pub use controller::{Animate, AnimateBuilder, AnimatorFn, TransitionFn};
pub use effect::{Cleanup, EffectSlot};
pub use error::AnimateError;
pub use presence::{Presence, PresenceCell};
pub use resolve::{resolve_request, resolve_sequence};
pub use run::{Run, RunState};
pub use runner::{IntentRunner, RunnerState};
pub use scope::AnimateScope;
