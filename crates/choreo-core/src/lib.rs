#![forbid(unsafe_code)]

//! Choreo Core
//!
//! Domain types shared by the choreo animation controller and any engine
//! implementation: property values, keyframe maps, animation targets,
//! call/sequence shapes, and the [`Engine`] seam that playback is driven
//! through.
//!
//! # Key Components
//!
//! - [`Value`] / [`Keyframes`] - what a call animates a target toward
//! - [`Element`] / [`Target`] - who is being animated; [`Target::Owned`] is
//!   the placeholder a controller resolves to its owned element
//! - [`Call`], [`Step`], [`Sequence`], [`Request`] - the shapes an engine
//!   invocation can take, including staggered and parallel steps
//! - [`Engine`] / [`PlaybackHandle`] - the invocation primitive and the
//!   stoppable, awaitable handle it returns
//! - [`ManualEngine`] - a deterministic, manually-advanced engine used by
//!   tests and demos
//! - [`FrameClock`] - wall-clock ticks for driving [`ManualEngine`] in real
//!   time
//!
//! # Role in choreo
//!
//! `choreo-core` knows nothing about lifecycles, presence, or cancellation.
//! It defines the vocabulary; `choreo-runtime` owns the policy.

pub mod clock;
pub mod engine;
pub mod keyframes;
pub mod manual;
pub mod motion;
pub mod target;
pub mod value;

pub use clock::FrameClock;
pub use engine::{Engine, EngineError, HandleCtl, Playback, PlaybackHandle};
pub use keyframes::Keyframes;
pub use manual::{ManualEngine, RecordedCall};
pub use motion::{At, Call, Easing, Options, Request, Sequence, Step, sequence};
pub use target::{Element, ElementId, Target};
pub use value::Value;
