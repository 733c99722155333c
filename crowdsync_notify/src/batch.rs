//! Coalescing of callbacks into rate-limited flushes
use crate::{Callback, ListenerKey};
use core::fmt;
use core::time::Duration;
use crowdsync_core::time::Timestamp;
use tracing::trace;

/// Queue of callbacks run together on the next allowed flush.
///
/// A callback queued several times before a flush runs once. Flushes are spaced at least
/// `min_interval` apart; a flush requested earlier leaves the queue untouched for the next
/// frame.
pub struct BatchScheduler {
    min_interval: Duration,
    queue: Vec<(ListenerKey, Callback)>,
    /// Swapped with `queue` during a flush so neither buffer is reallocated
    running: Vec<(ListenerKey, Callback)>,
    last_flush: Option<Timestamp>,
}

impl fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("min_interval", &self.min_interval)
            .field("queued", &self.queue.len())
            .field("last_flush", &self.last_flush)
            .finish()
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1) / 60)
    }
}

impl BatchScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            queue: Vec::new(),
            running: Vec::new(),
            last_flush: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Queue `callback` for the next flush. Returns false if it was already queued.
    pub fn schedule(&mut self, callback: Callback) -> bool {
        let key = ListenerKey::of(&callback);
        if self.queue.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.queue.push((key, callback));
        true
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn is_ready(&self, now: Timestamp) -> bool {
        self.last_flush
            .is_none_or(|last| now.saturating_sub(last) >= self.min_interval)
    }

    /// Run every queued callback once, unless the last flush was too recent.
    ///
    /// Returns the number of callbacks that ran.
    pub fn flush(&mut self, now: Timestamp) -> usize {
        if self.queue.is_empty() || !self.is_ready(now) {
            return 0;
        }
        self.last_flush = Some(now);
        core::mem::swap(&mut self.queue, &mut self.running);
        let count = self.running.len();
        trace!(count, "flushing batched callbacks");
        for (_, callback) in self.running.drain(..) {
            callback();
        }
        count
    }
}
