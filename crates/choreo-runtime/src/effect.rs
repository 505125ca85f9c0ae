#![forbid(unsafe_code)]

//! Dependency-scoped side effects with guaranteed cleanup.
//!
//! An [`EffectSlot`] re-runs a side-effecting body only when its dependency
//! value changes, always running the previous body's cleanup first. The
//! final cleanup runs on [`teardown`](EffectSlot::teardown). This is the
//! diff-then-restart lifecycle the controller hangs each intent on.

/// Cleanup action registered by an effect body.
pub type Cleanup = Box<dyn FnOnce()>;

/// One dependency-scoped effect.
pub struct EffectSlot<D> {
    label: &'static str,
    deps: Option<D>,
    cleanup: Option<Cleanup>,
}

impl<D: PartialEq> EffectSlot<D> {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            deps: None,
            cleanup: None,
        }
    }

    /// Run `body` if `deps` differ from the previous sync (or this is the
    /// first). The previous cleanup runs to completion before the new body
    /// starts. Returns whether the body ran.
    pub fn sync(&mut self, deps: D, body: impl FnOnce() -> Option<Cleanup>) -> bool {
        if self.deps.as_ref() == Some(&deps) {
            return false;
        }
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        tracing::trace!(target: "choreo.effect", effect = self.label, "effect body runs");
        self.cleanup = body();
        self.deps = Some(deps);
        true
    }

    /// Run the pending cleanup and forget the dependencies. The next `sync`
    /// will run its body unconditionally. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tracing::trace!(target: "choreo.effect", effect = self.label, "effect cleanup");
            cleanup();
        }
        self.deps = None;
    }
}

impl<D> std::fmt::Debug for EffectSlot<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("label", &self.label)
            .field("armed", &self.cleanup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) + Clone) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        (log, move |s: &str| l.borrow_mut().push(s.to_string()))
    }

    #[test]
    fn body_runs_on_first_sync() {
        let (log, rec) = recorder();
        let mut slot = EffectSlot::new("t");
        let ran = slot.sync(1, || {
            rec("body");
            None
        });
        assert!(ran);
        assert_eq!(*log.borrow(), vec!["body"]);
    }

    #[test]
    fn unchanged_deps_skip_the_body() {
        let (log, rec) = recorder();
        let mut slot = EffectSlot::new("t");
        slot.sync(1, || {
            rec("body");
            None
        });
        let ran = slot.sync(1, || {
            rec("body again");
            None
        });
        assert!(!ran);
        assert_eq!(*log.borrow(), vec!["body"]);
    }

    #[test]
    fn cleanup_runs_before_the_next_body() {
        let (log, rec) = recorder();
        let mut slot = EffectSlot::new("t");

        let r = rec.clone();
        slot.sync(1, move || {
            r("body 1");
            Some(Box::new(move || r("cleanup 1")) as Cleanup)
        });
        let r = rec.clone();
        slot.sync(2, move || {
            r("body 2");
            None
        });
        assert_eq!(*log.borrow(), vec!["body 1", "cleanup 1", "body 2"]);
    }

    #[test]
    fn teardown_runs_cleanup_and_rearms() {
        let (log, rec) = recorder();
        let mut slot = EffectSlot::new("t");
        let r = rec.clone();
        slot.sync(1, move || {
            let r2 = r.clone();
            Some(Box::new(move || r2("cleanup")))
        });
        slot.teardown();
        slot.teardown();
        assert_eq!(*log.borrow(), vec!["cleanup"]);

        // Same deps run again after teardown.
        let ran = slot.sync(1, || {
            rec("body after teardown");
            None
        });
        assert!(ran);
    }
}
