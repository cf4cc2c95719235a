//! Time sources the simulation reads its instants from.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use corridor_defence_core::{millis::saturating_millis, Timestamp};

/// Supplies the current instant to a simulation.
pub trait Clock {
    /// Current instant in Unix milliseconds.
    fn now(&self) -> Timestamp;
}

/// Clock reading Unix time once, then advancing with the monotonic clock.
///
/// Wall-clock adjustments after construction never move it backwards or make
/// it jump. Copies share the same origin.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
    origin_millis: u64,
}

impl SystemClock {
    /// Anchors a clock at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            origin: Instant::now(),
            origin_millis: saturating_millis(since_epoch),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = saturating_millis(self.origin.elapsed());
        Timestamp::from_millis(self.origin_millis.saturating_add(elapsed))
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle while the
/// simulation owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start.as_millis())),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        self.millis.store(instant.as_millis(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta = saturating_millis(delta);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |millis| {
                Some(millis.saturating_add(delta))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
