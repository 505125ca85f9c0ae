#![forbid(unsafe_code)]

//! Deterministic, manually-advanced engine.
//!
//! [`ManualEngine`] is the test double and demo driver for the [`Engine`]
//! seam. It keeps a virtual clock that only moves when [`advance`] is called,
//! which makes every controller scenario replayable: issue calls, advance
//! time, observe exactly which playbacks landed.
//!
//! # Scheduling
//!
//! For a single-call request the playback lands at `now + delay + duration`.
//! Sequence steps are laid out back-to-back from the moment of the request:
//!
//! - no `at`: the step starts where the previous step ended
//! - [`At::Absolute`]: the step starts at sequence start + offset
//! - [`At::Relative`]: the step starts at previous end + offset
//!
//! Group members share the group's slot; the group ends when its last member
//! does. Final keyframe values are written into the target element's
//! attributes when a step lands; a stopped playback writes nothing further.
//!
//! [`advance`]: ManualEngine::advance

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::engine::{Engine, EngineError, HandleCtl, PlaybackHandle};
use crate::keyframes::Keyframes;
use crate::motion::{At, Call, Request, Step};
use crate::target::{Element, Target};

/// One request the engine received, paired with the handle it returned.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: Request,
    pub handle: PlaybackHandle,
}

/// A scheduled write of final keyframe values.
struct Job {
    land: Duration,
    target: Element,
    keyframes: Keyframes,
    applied: bool,
}

struct ActivePlayback {
    ctl: HandleCtl,
    jobs: Vec<Job>,
}

#[derive(Default)]
struct EngineInner {
    now: Duration,
    active: Vec<ActivePlayback>,
    recorded: Vec<RecordedCall>,
}

/// Tick-driven engine for tests and demos. Cloning shares the engine.
#[derive(Clone, Default)]
pub struct ManualEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl ManualEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Move the virtual clock forward, landing every step whose schedule has
    /// elapsed and finishing playbacks whose last step landed.
    ///
    /// `advance(Duration::ZERO)` is legal and settles zero-length playbacks.
    pub fn advance(&self, dt: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.now += dt;
        let now = inner.now;
        inner.active.retain_mut(|playback| {
            if playback.ctl.is_stopped() {
                return false;
            }
            let mut remaining = false;
            for job in &mut playback.jobs {
                if job.applied {
                    continue;
                }
                if job.land <= now {
                    for (name, value) in job.keyframes.iter() {
                        job.target.set_attr(name, value.clone());
                    }
                    job.applied = true;
                } else {
                    remaining = true;
                }
            }
            if remaining {
                true
            } else {
                playback.ctl.finish();
                false
            }
        });
        trace!(
            target: "choreo.engine",
            now_ms = now.as_millis() as u64,
            active = inner.active.len(),
            "clock advanced"
        );
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.borrow().recorded.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.borrow().recorded.len()
    }

    /// Playbacks that have neither finished nor been stopped-and-collected.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }

    fn schedule(now: Duration, request: &Request) -> Result<Vec<Job>, EngineError> {
        let mut jobs = Vec::new();
        match request {
            Request::Single(call) => {
                jobs.push(Self::job_at(now, now, None, call)?);
            }
            Request::Sequence(seq) => {
                if seq.is_empty() {
                    return Err(EngineError::EmptyRequest);
                }
                let seq_start = now;
                let mut cursor = seq_start;
                for step in seq.steps() {
                    match step {
                        Step::Single(call) => {
                            let job = Self::job_at(seq_start, cursor, call.options.at, call)?;
                            cursor = job.land;
                            jobs.push(job);
                        }
                        Step::Group(calls) => {
                            if calls.is_empty() {
                                return Err(EngineError::EmptyRequest);
                            }
                            let group_start = cursor;
                            let mut group_end = group_start;
                            for call in calls {
                                let job =
                                    Self::job_at(seq_start, group_start, call.options.at, call)?;
                                group_end = group_end.max(job.land);
                                jobs.push(job);
                            }
                            cursor = group_end;
                        }
                    }
                }
            }
        }
        Ok(jobs)
    }

    fn job_at(
        seq_start: Duration,
        slot: Duration,
        at: Option<At>,
        call: &Call,
    ) -> Result<Job, EngineError> {
        let target = match &call.target {
            Target::Element(e) => e.clone(),
            Target::Owned => return Err(EngineError::UnresolvedTarget),
        };
        let start = match at {
            None => slot,
            Some(At::Absolute(d)) => seq_start + d,
            Some(At::Relative(d)) => slot + d,
        };
        Ok(Job {
            land: start + call.options.delay + call.options.duration,
            target,
            keyframes: call.keyframes.clone(),
            applied: false,
        })
    }
}

impl Engine for ManualEngine {
    fn animate(&self, request: Request) -> Result<PlaybackHandle, EngineError> {
        let now = self.now();
        let jobs = Self::schedule(now, &request)?;
        let (handle, ctl) = PlaybackHandle::pending();
        let mut inner = self.inner.borrow_mut();
        inner.recorded.push(RecordedCall {
            request,
            handle: handle.clone(),
        });
        inner.active.push(ActivePlayback { ctl, jobs });
        trace!(
            target: "choreo.engine",
            call_index = inner.recorded.len() - 1,
            "playback scheduled"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{Options, Sequence};
    use crate::value::Value;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn kf(name: &str, v: f64) -> Keyframes {
        Keyframes::new().set(name, v)
    }

    #[test]
    fn single_call_lands_after_duration() {
        let engine = ManualEngine::new();
        let elem = Element::new("circle");
        let handle = engine
            .animate(Call::new(elem.clone(), kf("r", 6.0), Options::new().duration(secs(1.0))).into())
            .unwrap();

        engine.advance(secs(0.5));
        assert!(!handle.is_settled());
        assert_eq!(elem.attr("r"), None);

        engine.advance(secs(0.5));
        assert!(handle.is_finished());
        assert_eq!(elem.attr("r"), Some(Value::Number(6.0)));
    }

    #[test]
    fn delay_pushes_the_landing_out() {
        let engine = ManualEngine::new();
        let elem = Element::new("circle");
        let opts = Options::new().duration(secs(1.0)).delay(secs(0.5));
        engine
            .animate(Call::new(elem.clone(), kf("r", 6.0), opts).into())
            .unwrap();

        engine.advance(secs(1.0));
        assert_eq!(elem.attr("r"), None);
        engine.advance(secs(0.5));
        assert_eq!(elem.attr("r"), Some(Value::Number(6.0)));
    }

    #[test]
    fn stopped_playback_writes_nothing() {
        let engine = ManualEngine::new();
        let elem = Element::new("circle");
        let handle = engine
            .animate(Call::new(elem.clone(), kf("r", 6.0), Options::new().duration(secs(1.0))).into())
            .unwrap();

        handle.stop();
        engine.advance(secs(2.0));
        assert_eq!(elem.attr("r"), None);
        assert!(handle.is_stopped());
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn sequence_steps_land_back_to_back() {
        let engine = ManualEngine::new();
        let elem = Element::new("rect");
        let seq = Sequence::new()
            .then(Call::new(elem.clone(), kf("height", 10.0), Options::new().duration(secs(1.0))))
            .then(Call::new(elem.clone(), kf("width", 20.0), Options::new().duration(secs(1.0))));
        let handle = engine.animate(seq.into()).unwrap();

        engine.advance(secs(1.0));
        assert_eq!(elem.attr("height"), Some(Value::Number(10.0)));
        assert_eq!(elem.attr("width"), None);
        assert!(!handle.is_settled());

        engine.advance(secs(1.0));
        assert_eq!(elem.attr("width"), Some(Value::Number(20.0)));
        assert!(handle.is_finished());
    }

    #[test]
    fn absolute_at_overlaps_steps() {
        let engine = ManualEngine::new();
        let elem = Element::new("rect");
        let seq = Sequence::new()
            .then(Call::new(elem.clone(), kf("x", 1.0), Options::new().duration(secs(1.0))))
            .then(Call::new(
                elem.clone(),
                kf("y", 2.0),
                Options::new().duration(secs(1.0)).at(At::Absolute(secs(0.5))),
            ));
        engine.animate(seq.into()).unwrap();

        // Second step starts at t=0.5 and lands at t=1.5, not t=2.
        engine.advance(secs(1.5));
        assert_eq!(elem.attr("y"), Some(Value::Number(2.0)));
    }

    #[test]
    fn group_members_run_in_parallel() {
        let engine = ManualEngine::new();
        let a = Element::new("circle");
        let b = Element::new("circle");
        let seq = Sequence::new().then(vec![
            Call::new(a.clone(), kf("r", 1.0), Options::new().duration(secs(1.0))),
            Call::new(b.clone(), kf("r", 2.0), Options::new().duration(secs(1.0))),
        ]);
        let handle = engine.animate(seq.into()).unwrap();

        engine.advance(secs(1.0));
        assert_eq!(a.attr("r"), Some(Value::Number(1.0)));
        assert_eq!(b.attr("r"), Some(Value::Number(2.0)));
        assert!(handle.is_finished());
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let engine = ManualEngine::new();
        assert_eq!(
            engine.animate(Sequence::new().into()).unwrap_err(),
            EngineError::EmptyRequest
        );
    }

    #[test]
    fn unresolved_target_is_rejected() {
        let engine = ManualEngine::new();
        let err = engine
            .animate(Call::owned(kf("r", 6.0), Options::new()).into())
            .unwrap_err();
        assert_eq!(err, EngineError::UnresolvedTarget);
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn zero_duration_settles_on_zero_advance() {
        let engine = ManualEngine::new();
        let elem = Element::new("circle");
        let handle = engine
            .animate(Call::new(elem.clone(), kf("r", 6.0), Options::new().duration(Duration::ZERO)).into())
            .unwrap();
        engine.advance(Duration::ZERO);
        assert!(handle.is_finished());
        assert_eq!(elem.attr("r"), Some(Value::Number(6.0)));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn playback_settles_exactly_at_its_landing_time(
                dur_ms in 1u64..5_000,
                delay_ms in 0u64..1_000,
            ) {
                let engine = ManualEngine::new();
                let elem = Element::new("circle");
                let opts = Options::new()
                    .duration(Duration::from_millis(dur_ms))
                    .delay(Duration::from_millis(delay_ms));
                let handle = engine
                    .animate(Call::new(elem.clone(), kf("v", 1.0), opts).into())
                    .unwrap();

                let land = dur_ms + delay_ms;
                engine.advance(Duration::from_millis(land - 1));
                prop_assert!(!handle.is_settled());
                prop_assert_eq!(elem.attr("v"), None);

                engine.advance(Duration::from_millis(1));
                prop_assert!(handle.is_finished());
                prop_assert_eq!(elem.attr("v"), Some(Value::Number(1.0)));
            }
        }
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let engine = ManualEngine::new();
        let elem = Element::new("circle");
        engine
            .animate(Call::new(elem.clone(), kf("r", 1.0), Options::new()).into())
            .unwrap();
        engine
            .animate(Call::new(elem, kf("r", 2.0), Options::new()).into())
            .unwrap();
        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        let first = calls[0].request.calls()[0].keyframes.clone();
        assert_eq!(first.get("r"), Some(&Value::Number(1.0)));
    }
}
