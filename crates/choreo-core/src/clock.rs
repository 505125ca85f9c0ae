#![forbid(unsafe_code)]

//! Wall-clock frame ticks.

use std::time::Duration;

use web_time::Instant;

/// Measures elapsed time between frames for driving
/// [`ManualEngine::advance`](crate::ManualEngine::advance) in real time.
///
/// The first call to [`tick`](Self::tick) returns `Duration::ZERO`; every
/// subsequent call returns the time since the previous one.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = match self.last {
            Some(last) => now.duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        dt
    }
}
