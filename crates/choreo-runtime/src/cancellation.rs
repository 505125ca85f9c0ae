#![forbid(unsafe_code)]

//! Cooperative cancellation for runs.
//!
//! [`CancelSource`] is the control side; [`CancelToken`] is the observer a
//! scoped animate function polls before every call. All controller work is
//! single-threaded, so the token is a shared flag with no wakeup machinery:
//! cancellation takes effect at the next call site that checks it.
//!
//! Dropping the source does **not** cancel outstanding tokens — cancellation
//! is always an explicit [`cancel`](CancelSource::cancel).

use std::cell::Cell;
use std::rc::Rc;

/// Control handle that triggers cancellation for one run.
#[derive(Default)]
pub struct CancelSource {
    flag: Rc<Cell<bool>>,
}

impl CancelSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a token observing this source. Tokens are cheap to clone.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Rc::clone(&self.flag),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }
}

/// Observer side of a [`CancelSource`].
#[derive(Clone)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.flag.get())
            .finish()
    }
}
