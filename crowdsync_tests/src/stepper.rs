use bevy_math::Vec3;
use core::time::Duration;
use crowdsync::error::Result;
use crowdsync::prelude::*;
use bevy_platform::sync::Arc;
use bevy_platform::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Engine driven by a [`ManualClock`], advanced one frame at a time
pub struct SyncStepper {
    pub engine: SyncEngine,
    pub clock: ManualClock,
    pub frame_duration: Duration,
}

impl Default for SyncStepper {
    fn default() -> Self {
        Self::new(SyncConfig::default(), Duration::from_millis(16))
    }
}

impl SyncStepper {
    pub fn new(config: SyncConfig, frame_duration: Duration) -> Self {
        let clock = ManualClock::new();
        Self {
            engine: SyncEngine::with_clock(config, clock.clone()),
            clock,
            frame_duration,
        }
    }

    /// Stepper whose interpolation loop is already running
    pub fn started() -> Self {
        let mut stepper = Self::default();
        stepper.engine.start();
        stepper
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Move time forward without running a frame
    pub fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Advance by one frame and run it
    pub fn frame_step(&mut self) -> UpdateReport {
        self.clock.advance(self.frame_duration);
        let report = self.engine.update();
        trace!(now = ?self.now(), ?report, "frame");
        report
    }

    /// Run `n` frames, returning the total number of records swept
    pub fn frame_step_n(&mut self, n: usize) -> usize {
        (0..n).map(|_| self.frame_step().swept).sum()
    }

    /// State update for `identifier` as its sender would build it
    pub fn state(identifier: &str, position: Vec3) -> StateUpdate {
        StateUpdate::new(identity_hash(identifier), position, 0.0)
    }

    pub fn update_remote(&mut self, identifier: &str, position: Vec3) -> Result<Acquired> {
        self.engine
            .apply_remote_update(identifier, &Self::state(identifier, position))
    }

    /// Encode `updates` as one wire batch and feed it to the engine
    pub fn send_updates(&mut self, updates: &[StateUpdate]) -> Result<IngressReport> {
        let bytes = encode_batch(updates)?;
        self.engine.apply_batch(&bytes)
    }

    pub fn send_batch(&mut self, states: &[(&str, Vec3)]) -> Result<IngressReport> {
        let updates: Vec<StateUpdate> = states
            .iter()
            .map(|(identifier, position)| Self::state(identifier, *position))
            .collect();
        self.send_updates(&updates)
    }

    /// Register a listener that counts how many times it was notified
    pub fn counting_listener(&mut self) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        self.engine.add_listener(Arc::new(move || {
            inner.fetch_add(1, Ordering::Relaxed);
        }));
        count
    }

    pub fn position(&self, identifier: &str) -> Option<Vec3> {
        self.engine.record(identifier).map(EntityRecord::position)
    }
}
