//! Notifications for hosts that only care that something changed.
//!
//! The [`UpdateNotifier`](notifier::UpdateNotifier) tells UI listeners about structural changes
//! (participants joining or leaving) with a debounce, so a burst of joins causes one refresh.
//! The [`BatchScheduler`](batch::BatchScheduler) coalesces arbitrary callbacks into a single
//! flush per frame, at most `batch_max_frequency_hz` times per second.

use bevy_platform::sync::Arc;
use bevy_reflect::Reflect;
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub mod batch;
pub mod notifier;

pub mod prelude {
    pub use crate::batch::BatchScheduler;
    pub use crate::notifier::UpdateNotifier;
    pub use crate::{Callback, ListenerKey, NotifierConfig};
}

/// Callback registered with the notifier or the batch scheduler
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Identity of a [`Callback`]: two clones of the same `Arc` have the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(usize);

impl ListenerKey {
    pub fn of(callback: &Callback) -> Self {
        Self(Arc::as_ptr(callback).cast::<()>() as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct NotifierConfig {
    /// Quiet period after the last `notify` before listeners run
    pub debounce: Duration,
    /// Upper bound on batch scheduler flushes per second. 0 means no limit.
    pub batch_max_frequency_hz: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(32),
            batch_max_frequency_hz: 60,
        }
    }
}

impl NotifierConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_batch_max_frequency_hz(mut self, hz: u32) -> Self {
        self.batch_max_frequency_hz = hz;
        self
    }

    /// Shortest time between two batch flushes
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(1)
            .checked_div(self.batch_max_frequency_hz)
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_key_follows_allocation() {
        let a: Callback = Arc::new(|| {});
        let b: Callback = Arc::new(|| {});
        assert_eq!(ListenerKey::of(&a), ListenerKey::of(&a.clone()));
        assert_ne!(ListenerKey::of(&a), ListenerKey::of(&b));
    }

    #[test]
    fn test_batch_interval() {
        let config = NotifierConfig::default();
        assert_eq!(config.batch_interval(), Duration::from_secs(1) / 60);
        assert_eq!(
            config.with_batch_max_frequency_hz(0).batch_interval(),
            Duration::ZERO
        );
    }
}
