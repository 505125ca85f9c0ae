#![forbid(unsafe_code)]

//! The animation lifecycle controller.
//!
//! [`Animate`] owns exactly one [`Element`] and reconciles up to three ways
//! of saying "how should this element move" against one [`Engine`]:
//!
//! - an **ad hoc animator**: an arbitrary async procedure given a scoped
//!   animate function and the current presence observation
//! - a **fixed sequence**: issued as one engine call, reissued when the
//!   sequence value changes
//! - an **enter/exit pair**: `enter` runs when the element is present,
//!   `exit` runs when it starts exiting, and removal is confirmed to the
//!   host only after `exit` resolves
//!
//! Each supplied intent gets its own [`IntentRunner`] hung on an
//! [`EffectSlot`], so a dependency change cancels the previous run — flag
//! set, tracked handles stopped — before the next run issues anything.
//!
//! # Driving
//!
//! The controller owns a single-threaded executor. The host loop is:
//! advance the engine, then [`drive`](Animate::drive) to let suspended
//! callbacks resume. Nothing runs on other threads.
//!
//! # What the controller does not do
//!
//! It computes no geometry and implements no easing; callers supply values,
//! the engine plays them. A stalled callback that never resolves leaves its
//! runner active indefinitely — there is no timeout.

use std::future::Future;
use std::rc::Rc;

use choreo_core::{Element, Engine, Sequence};
use futures::FutureExt;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::effect::EffectSlot;
use crate::error::AnimateError;
use crate::presence::{Presence, PresenceCell};
use crate::runner::{IntentRunner, RunnerState};
use crate::scope::AnimateScope;

/// Ad hoc intent: free to issue any number of calls in any order.
pub type AnimatorFn =
    Rc<dyn Fn(AnimateScope, Presence) -> LocalBoxFuture<'static, Result<(), AnimateError>>>;

/// Enter or exit intent: one procedure per presence transition.
pub type TransitionFn = Rc<dyn Fn(AnimateScope) -> LocalBoxFuture<'static, Result<(), AnimateError>>>;

/// Builder for [`Animate`]. Obtained via [`Animate::builder`].
pub struct AnimateBuilder {
    engine: Rc<dyn Engine>,
    child: Element,
    presence: Option<PresenceCell>,
    animator: Option<AnimatorFn>,
    sequence: Option<Sequence>,
    enter: Option<TransitionFn>,
    exit: Option<TransitionFn>,
}

impl AnimateBuilder {
    /// Attach an externally-managed presence cell. Without one the
    /// controller creates its own, which simply never exits.
    #[must_use]
    pub fn presence(mut self, cell: PresenceCell) -> Self {
        self.presence = Some(cell);
        self
    }

    /// Supply the ad hoc animator intent.
    #[must_use]
    pub fn animator<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AnimateScope, Presence) -> Fut + 'static,
        Fut: Future<Output = Result<(), AnimateError>> + 'static,
    {
        self.animator = Some(Rc::new(move |scope, presence| {
            f(scope, presence).boxed_local()
        }));
        self
    }

    /// Supply the fixed-sequence intent.
    #[must_use]
    pub fn sequence(mut self, seq: Sequence) -> Self {
        self.sequence = Some(seq);
        self
    }

    /// Supply the enter half of the enter/exit intent.
    #[must_use]
    pub fn enter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AnimateScope) -> Fut + 'static,
        Fut: Future<Output = Result<(), AnimateError>> + 'static,
    {
        self.enter = Some(Rc::new(move |scope| f(scope).boxed_local()));
        self
    }

    /// Supply the exit half of the enter/exit intent. Removal is confirmed
    /// to the host only after this procedure resolves.
    #[must_use]
    pub fn exit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AnimateScope) -> Fut + 'static,
        Fut: Future<Output = Result<(), AnimateError>> + 'static,
    {
        self.exit = Some(Rc::new(move |scope| f(scope).boxed_local()));
        self
    }

    /// Build the controller. It owns its child from here on; call
    /// [`mount`](Animate::mount) to start intents.
    #[must_use]
    pub fn build(self) -> Animate {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Animate {
            engine: self.engine,
            child: self.child,
            presence: self.presence.unwrap_or_default(),
            animator: self.animator,
            sequence: self.sequence,
            enter: self.enter,
            exit: self.exit,
            sequence_runner: IntentRunner::new("sequence", spawner.clone()),
            animator_runner: IntentRunner::new("animator", spawner.clone()),
            transition_runner: IntentRunner::new("transition", spawner),
            sequence_slot: EffectSlot::new("sequence"),
            animator_slot: EffectSlot::new("animator"),
            transition_slot: EffectSlot::new("transition"),
            pool,
            mounted: false,
            torn_down: false,
        }
    }
}

/// Declarative animation lifecycle controller for one element.
pub struct Animate {
    engine: Rc<dyn Engine>,
    child: Element,
    presence: PresenceCell,
    animator: Option<AnimatorFn>,
    sequence: Option<Sequence>,
    enter: Option<TransitionFn>,
    exit: Option<TransitionFn>,
    sequence_runner: IntentRunner,
    animator_runner: IntentRunner,
    transition_runner: IntentRunner,
    sequence_slot: EffectSlot<Option<Sequence>>,
    animator_slot: EffectSlot<Presence>,
    transition_slot: EffectSlot<Presence>,
    pool: LocalPool,
    mounted: bool,
    torn_down: bool,
}

impl Animate {
    /// Start building a controller around `child`, driving `engine`.
    #[must_use]
    pub fn builder(engine: Rc<dyn Engine>, child: Element) -> AnimateBuilder {
        AnimateBuilder {
            engine,
            child,
            presence: None,
            animator: None,
            sequence: None,
            enter: None,
            exit: None,
        }
    }

    /// The owned element, rendered unchanged by the host.
    #[must_use]
    pub fn child(&self) -> &Element {
        &self.child
    }

    #[must_use]
    pub fn presence(&self) -> &PresenceCell {
        &self.presence
    }

    /// Mount the controller: every configured intent starts. Idempotent; a
    /// torn-down controller stays down.
    pub fn mount(&mut self) {
        if self.mounted || self.torn_down {
            debug!(target: "choreo.controller", "mount ignored");
            return;
        }
        self.mounted = true;
        debug!(target: "choreo.controller", element = self.child.id(), "mounted");
        self.sync_sequence();
        self.sync_animator();
        self.sync_transition();
    }

    /// Replace (or clear) the fixed sequence. A changed value stops the
    /// prior sequence playback before the new sequence is issued; an equal
    /// value is a no-op.
    pub fn set_sequence(&mut self, seq: Option<Sequence>) {
        self.sequence = seq;
        if self.mounted {
            self.sync_sequence();
        }
    }

    /// Tell the controller its presence cell changed. The host calls this
    /// after [`PresenceCell::begin_exit`].
    pub fn notify_presence(&mut self) {
        if !self.mounted {
            return;
        }
        self.sync_animator();
        self.sync_transition();
    }

    /// Run suspended intent callbacks until they stall again (waiting on a
    /// playback handle or finished).
    pub fn drive(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Final teardown: cancel every active run and stop all tracked
    /// handles, regardless of intent type. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.mounted = false;
        self.sequence_slot.teardown();
        self.animator_slot.teardown();
        self.transition_slot.teardown();
        self.sequence_runner.cancel();
        self.animator_runner.cancel();
        self.transition_runner.cancel();
        debug!(target: "choreo.controller", element = self.child.id(), "torn down");
    }

    /// State of the fixed-sequence runner.
    #[must_use]
    pub fn sequence_state(&self) -> RunnerState {
        self.sequence_runner.state()
    }

    /// State of the ad hoc animator runner.
    #[must_use]
    pub fn animator_state(&self) -> RunnerState {
        self.animator_runner.state()
    }

    /// State of the enter/exit runner.
    #[must_use]
    pub fn transition_state(&self) -> RunnerState {
        self.transition_runner.state()
    }

    fn scope_factory(&self) -> impl Fn(crate::run::Run) -> AnimateScope + 'static {
        let engine = Rc::clone(&self.engine);
        let child = self.child.clone();
        move |run| AnimateScope::new(Rc::clone(&engine), child.clone(), run)
    }

    fn sync_sequence(&mut self) {
        let deps = self.sequence.clone();
        let runner = self.sequence_runner.clone();
        let make_scope = self.scope_factory();
        self.sequence_slot.sync(deps.clone(), move || {
            let Some(seq) = deps else {
                runner.cancel();
                return None;
            };
            runner.restart(move |run| {
                let scope = make_scope(run);
                async move {
                    let handle = scope.animate_sequence(seq)?;
                    handle.await;
                    Ok(())
                }
                .boxed_local()
            });
            let r = runner.clone();
            Some(Box::new(move || r.cancel()))
        });
    }

    fn sync_animator(&mut self) {
        let Some(animator) = self.animator.clone() else {
            return;
        };
        let observed = self.presence.state();
        let runner = self.animator_runner.clone();
        let make_scope = self.scope_factory();
        self.animator_slot.sync(observed, move || {
            runner.restart(move |run| animator(make_scope(run), observed));
            let r = runner.clone();
            Some(Box::new(move || r.cancel()))
        });
    }

    fn sync_transition(&mut self) {
        if self.enter.is_none() && self.exit.is_none() {
            return;
        }
        let observed = self.presence.state();
        let runner = self.transition_runner.clone();
        let make_scope = self.scope_factory();
        let enter = self.enter.clone();
        let exit = self.exit.clone();
        let presence = self.presence.clone();
        self.transition_slot.sync(observed, move || {
            match observed {
                Presence::Present => {
                    let Some(enter) = enter else { return None };
                    runner.restart(move |run| enter(make_scope(run)));
                }
                Presence::Exiting => {
                    let Some(exit) = exit else {
                        // No exit intent: the prior cleanup already cancelled
                        // enter; removal timing belongs to the host.
                        return None;
                    };
                    runner.restart(move |run| {
                        let fut = exit(make_scope(run));
                        async move {
                            fut.await?;
                            presence.confirm_removal();
                            Ok(())
                        }
                        .boxed_local()
                    });
                }
            }
            let r = runner.clone();
            Some(Box::new(move || r.cancel()))
        });
    }
}

impl Drop for Animate {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Animate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animate")
            .field("child", &self.child)
            .field("presence", &self.presence)
            .field("mounted", &self.mounted)
            .field("sequence", &self.sequence_runner.state())
            .field("animator", &self.animator_runner.state())
            .field("transition", &self.transition_runner.state())
            .finish()
    }
}
