/*!
Time sources for the engine.

All timestamps are [`Duration`]s measured from the origin of a [`Clock`]. The engine never reads
wall time directly: hosts hand it a [`SystemClock`], tests hand it a [`ManualClock`] and advance
it explicitly, which makes debounce windows, staleness thresholds and interpolation steps
fully deterministic.
*/
use bevy_platform::sync::Arc;
use bevy_platform::sync::atomic::{AtomicU64, Ordering};
use bevy_platform::time::Instant;
use core::time::Duration;

/// Time elapsed since the origin of the clock that produced it
pub type Timestamp = Duration;

/// Source of monotonic timestamps
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock backed by [`Instant`], with its origin at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep a handle while the engine owns
/// another one.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn set(&self, timestamp: Timestamp) {
        self.nanos
            .store(timestamp.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        assert_eq!(clock.now(), Duration::ZERO);

        handle.advance(Duration::from_millis(16));
        handle.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(32));

        handle.set(Duration::from_secs(5));
        assert_eq!(clock.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
