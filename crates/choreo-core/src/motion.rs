#![forbid(unsafe_code)]

//! Call, step, and sequence shapes.
//!
//! One engine invocation is a [`Request`]: either a single [`Call`] or a
//! [`Sequence`] of [`Step`]s. A step is a single call or a parallel group of
//! calls; per-step [`At`] offsets express staggered and overlapping starts.
//!
//! All shapes are plain data with `PartialEq` — the runtime compares a
//! sequence against its previous value to decide whether a runner restarts.

use std::time::Duration;

use crate::keyframes::Keyframes;
use crate::target::Target;

/// Default duration applied when a call's options leave it unset.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

/// Easing curve, forwarded to the engine uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

/// When a sequence step starts, relative to its default slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum At {
    /// Offset from the start of the whole sequence.
    Absolute(Duration),
    /// Offset from the end of the previous step.
    Relative(Duration),
}

/// Per-call animation options.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub duration: Duration,
    pub delay: Duration,
    pub easing: Easing,
    /// Start offset within a sequence. Ignored for single-call requests.
    pub at: Option<At>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            delay: Duration::ZERO,
            easing: Easing::default(),
            at: None,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn duration(mut self, d: Duration) -> Self {
        self.duration = d;
        self
    }

    #[must_use]
    pub fn delay(mut self, d: Duration) -> Self {
        self.delay = d;
        self
    }

    #[must_use]
    pub fn easing(mut self, e: Easing) -> Self {
        self.easing = e;
        self
    }

    #[must_use]
    pub fn at(mut self, at: At) -> Self {
        self.at = Some(at);
        self
    }
}

/// One animation call: a target, the keyframes to drive it toward, and
/// options.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub target: Target,
    pub keyframes: Keyframes,
    pub options: Options,
}

impl Call {
    #[must_use]
    pub fn new(target: impl Into<Target>, keyframes: Keyframes, options: Options) -> Self {
        Self {
            target: target.into(),
            keyframes,
            options,
        }
    }

    /// Call against the owning controller's element.
    #[must_use]
    pub fn owned(keyframes: Keyframes, options: Options) -> Self {
        Self {
            target: Target::Owned,
            keyframes,
            options,
        }
    }
}

/// One element of a sequence: a single call, or calls started in parallel.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Single(Call),
    Group(Vec<Call>),
}

impl From<Call> for Step {
    fn from(c: Call) -> Self {
        Step::Single(c)
    }
}

impl From<Vec<Call>> for Step {
    fn from(calls: Vec<Call>) -> Self {
        Step::Group(calls)
    }
}

/// An ordered list of steps issued to the engine as one request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step (builder pattern).
    #[must_use]
    pub fn then(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn push(&mut self, step: impl Into<Step>) {
        self.steps.push(step.into());
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromIterator<Step> for Sequence {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Build a sequence from steps.
pub fn sequence(steps: impl IntoIterator<Item = Step>) -> Sequence {
    steps.into_iter().collect()
}

/// What reaches an engine: one call or a whole sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Single(Call),
    Sequence(Sequence),
}

impl Request {
    /// Every call in the request, in declaration order.
    pub fn calls(&self) -> Vec<&Call> {
        match self {
            Request::Single(c) => vec![c],
            Request::Sequence(seq) => seq
                .steps()
                .iter()
                .flat_map(|step| match step {
                    Step::Single(c) => std::slice::from_ref(c).iter(),
                    Step::Group(cs) => cs.iter(),
                })
                .collect(),
        }
    }
}

impl From<Call> for Request {
    fn from(c: Call) -> Self {
        Request::Single(c)
    }
}

impl From<Sequence> for Request {
    fn from(s: Sequence) -> Self {
        Request::Sequence(s)
    }
}
