//! Debounced listener notification
use crate::{Callback, ListenerKey};
use core::fmt;
use core::time::Duration;
use crowdsync_core::time::Timestamp;
use tracing::{debug, trace};

/// Registry of listeners, invoked once a burst of [`notify`](UpdateNotifier::notify) calls has
/// been quiet for a full debounce window.
///
/// This is a debounce, not a throttle: every call pushes the deadline back, so listeners never
/// run while calls keep arriving faster than the window.
pub struct UpdateNotifier {
    debounce: Duration,
    listeners: Vec<(ListenerKey, Callback)>,
    deadline: Option<Timestamp>,
    flushes: u64,
}

impl fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("debounce", &self.debounce)
            .field("listeners", &self.listeners.len())
            .field("deadline", &self.deadline)
            .field("flushes", &self.flushes)
            .finish()
    }
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(32))
    }
}

impl UpdateNotifier {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            listeners: Vec::new(),
            deadline: None,
            flushes: 0,
        }
    }

    /// Register a listener. Adding the same `Arc` twice keeps a single registration.
    pub fn add_listener(&mut self, listener: Callback) -> ListenerKey {
        let key = ListenerKey::of(&listener);
        if !self.listeners.iter().any(|(k, _)| *k == key) {
            self.listeners.push((key, listener));
        }
        key
    }

    /// Returns false if no listener was registered under `key`
    pub fn remove_listener(&mut self, key: ListenerKey) -> bool {
        let Some(index) = self.listeners.iter().position(|(k, _)| *k == key) else {
            return false;
        };
        self.listeners.swap_remove(index);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Schedule a flush one debounce window after `now`, replacing any pending deadline
    pub fn notify(&mut self, now: Timestamp) {
        trace!(?now, "notification pending");
        self.deadline = Some(now + self.debounce);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Number of times listeners were invoked so far
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Invoke the listeners if the pending deadline has passed. Returns true if they ran.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.flush();
                true
            }
            _ => false,
        }
    }

    /// Invoke every listener right away and clear the pending deadline
    pub fn flush(&mut self) {
        self.deadline = None;
        self.flushes += 1;
        debug!(listeners = self.listeners.len(), "notifying listeners");
        for (_, listener) in &self.listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_platform::sync::Arc;
    use bevy_platform::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let callback: Callback = Arc::new(move || {
            inner.fetch_add(1, Ordering::Relaxed);
        });
        (count, callback)
    }

    fn ms(millis: u64) -> Timestamp {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_burst_collapses_to_one_flush() {
        let mut notifier = UpdateNotifier::default();
        let (count, listener) = counter();
        notifier.add_listener(listener);

        for t in [0, 10, 20, 30] {
            notifier.notify(ms(t));
            assert!(!notifier.poll(ms(t)));
        }
        // 32ms after the first call, but only 10ms after the last one
        assert!(!notifier.poll(ms(40)));
        assert_eq!(count.load(Ordering::Relaxed), 0);

        assert!(notifier.poll(ms(62)));
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(!notifier.is_pending());
        assert!(!notifier.poll(ms(200)));
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_spaced_calls_flush_each_time() {
        let mut notifier = UpdateNotifier::default();
        let (count, listener) = counter();
        notifier.add_listener(listener);

        notifier.notify(ms(0));
        assert!(notifier.poll(ms(32)));
        notifier.notify(ms(100));
        assert!(notifier.poll(ms(150)));
        assert_eq!(count.load(Ordering::Relaxed), 2);
        assert_eq!(notifier.flushes(), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut notifier = UpdateNotifier::default();
        let (count, listener) = counter();
        let key = notifier.add_listener(listener.clone());
        assert_eq!(notifier.add_listener(listener), key);
        assert_eq!(notifier.listener_count(), 1);

        notifier.flush();
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_remove() {
        let mut notifier = UpdateNotifier::default();
        let (count, listener) = counter();
        let (_, other) = counter();
        let key = notifier.add_listener(listener);
        let other_key = ListenerKey::of(&other);

        assert!(!notifier.remove_listener(other_key));
        assert!(notifier.remove_listener(key));
        assert!(!notifier.remove_listener(key));

        notifier.notify(ms(0));
        assert!(notifier.poll(ms(32)));
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }
}
