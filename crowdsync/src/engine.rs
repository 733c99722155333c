//! The engine that owns all synchronization state of one session
use crate::config::SyncConfig;
use crate::error::Result;
use crate::stats::SyncStats;
use bevy_ecs::prelude::Resource;
use bevy_math::Vec3;
use core::fmt;
use core::time::Duration;
use crowdsync_core::lod::LodLevel;
use crowdsync_core::time::{Clock, SystemClock, Timestamp};
use crowdsync_core::update::{StateUpdate, decode_batch_into};
use crowdsync_interpolation::interpolate::{Interpolator, TickReport};
use crowdsync_interpolation::lod::{LodClassifier, LodCounts};
use crowdsync_interpolation::visible::VisibleSet;
use crowdsync_notify::batch::BatchScheduler;
use crowdsync_notify::notifier::UpdateNotifier;
use crowdsync_notify::{Callback, ListenerKey};
use crowdsync_replication::pool::{AcquireStatus, Acquired, EntityPool};
use crowdsync_replication::receive::IngressReport;
use crowdsync_replication::record::{EntityProfile, EntityRecord};
use crowdsync_replication::sweep::StalenessSweeper;
use bevy_platform::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What a call to [`SyncEngine::update`] did
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct UpdateReport {
    /// Records released by the periodic sweep
    pub swept: usize,
    pub tier_counts: LodCounts,
    pub visible: usize,
    /// `None` if the interpolation loop is stopped
    pub tick: Option<TickReport>,
    /// True if the listeners were notified during this update
    pub notified: bool,
    /// Batched callbacks that ran
    pub batched: usize,
}

/// Client-side state of every remote participant of a session.
///
/// The engine is single-threaded: it is `Send` and can be moved to the thread that drives it,
/// and state from other threads should be sent there rather than shared.
///
/// A frame usually looks like:
/// - feed it remote state with [`apply_remote_update`](Self::apply_remote_update) or
///   [`apply_batch`](Self::apply_batch) as it arrives;
/// - move the observer with [`set_observer`](Self::set_observer);
/// - call [`update`](Self::update), then render [`visible_records`](Self::visible_records).
///
/// Structural changes (a participant joins, leaves, is evicted or swept) invalidate the visible
/// set and schedule a debounced notification for the listeners.
#[derive(Resource)]
pub struct SyncEngine {
    config: SyncConfig,
    clock: Arc<dyn Clock>,
    pool: EntityPool,
    classifier: LodClassifier,
    visible: VisibleSet,
    interpolator: Interpolator,
    notifier: UpdateNotifier,
    batch: BatchScheduler,
    sweeper: StalenessSweeper,
    /// Reused to decode wire batches
    decode_buffer: Vec<StateUpdate>,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("active", &self.pool.active_count())
            .field("observer", &self.classifier.observer())
            .field("state", &self.interpolator.state())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_clock(config, SystemClock::default())
    }

    pub fn with_clock(config: SyncConfig, clock: impl Clock) -> Self {
        info!(
            capacity = config.pool.capacity,
            visible_capacity = config.visible_capacity,
            "creating sync engine"
        );
        Self {
            config,
            clock: Arc::new(clock),
            pool: EntityPool::new(config.pool),
            classifier: LodClassifier::new(config.lod),
            visible: VisibleSet::new(config.visible_capacity),
            interpolator: Interpolator::new(config.interpolation),
            notifier: UpdateNotifier::new(config.notifier.debounce),
            batch: BatchScheduler::new(config.notifier.batch_interval()),
            sweeper: StalenessSweeper::new(config.sweep),
            decode_buffer: Vec::with_capacity(config.pool.capacity),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn structure_changed(&mut self, now: Timestamp) {
        self.visible.invalidate();
        self.notifier.notify(now);
    }

    fn on_acquired(&mut self, identifier: &str, acquired: &Acquired, now: Timestamp) {
        match &acquired.status {
            AcquireStatus::Existing => {}
            AcquireStatus::Bound => {
                debug!(?identifier, slot = acquired.slot, "participant joined");
                self.structure_changed(now);
            }
            AcquireStatus::Replaced { evicted } => {
                debug!(
                    ?identifier,
                    ?evicted,
                    slot = acquired.slot,
                    "participant took the slot of an evicted one"
                );
                self.structure_changed(now);
            }
        }
    }

    // Ingress

    /// Write a remote participant's state, tracking it if it is new.
    ///
    /// Only the target state is written; the rendered state catches up through interpolation.
    pub fn apply_remote_update(
        &mut self,
        identifier: &str,
        update: &StateUpdate,
    ) -> Result<Acquired> {
        let now = self.now();
        let acquired = self
            .pool
            .apply_remote_update(identifier, update, now)
            .inspect_err(|error| warn!(?identifier, %error, "dropped remote update"))?;
        self.on_acquired(identifier, &acquired, now);
        Ok(acquired)
    }

    /// Decode a wire batch and apply each record to the participant owning its hash.
    ///
    /// A malformed buffer is rejected as a whole. Records for hashes that are not tracked are
    /// skipped and counted in the report.
    pub fn apply_batch(&mut self, bytes: &[u8]) -> Result<IngressReport> {
        decode_batch_into(bytes, &mut self.decode_buffer).inspect_err(|error| {
            warn!(len = bytes.len(), %error, "rejected state batch");
        })?;
        let now = self.now();
        let report = self.pool.apply_wire_batch(&self.decode_buffer, now);
        if report.unknown > 0 {
            warn!(unknown = report.unknown, "state batch referenced untracked participants");
        }
        trace!(applied = report.applied, "applied state batch");
        Ok(report)
    }

    pub fn apply_profile(&mut self, identifier: &str, profile: &EntityProfile) -> Result<Acquired> {
        let now = self.now();
        let acquired = self.pool.apply_profile(identifier, profile, now)?;
        self.on_acquired(identifier, &acquired, now);
        Ok(acquired)
    }

    /// The participant left. Returns false if it was not tracked.
    pub fn release(&mut self, identifier: &str) -> bool {
        if !self.pool.release(identifier) {
            return false;
        }
        let now = self.now();
        self.structure_changed(now);
        true
    }

    // Classification and egress

    pub fn observer(&self) -> Vec3 {
        self.classifier.observer()
    }

    pub fn set_observer(&mut self, observer: Vec3) {
        self.classifier.set_observer(observer);
    }

    /// Recompute distance and LOD of every record. Run it once per frame, before reading the
    /// visible set.
    pub fn classify(&mut self) -> LodCounts {
        let counts = self.classifier.classify(&mut self.pool);
        self.visible.invalidate();
        #[cfg(feature = "metrics")]
        metrics::gauge!("crowdsync::pool::active").set(self.pool.active_count() as f64);
        counts
    }

    /// Slots of the closest visible records, ascending by distance
    pub fn visible_sorted(&mut self) -> &[usize] {
        self.visible.get_sorted(&self.pool)
    }

    /// Closest visible records, ascending by distance
    pub fn visible_records(&mut self) -> impl Iterator<Item = &EntityRecord> {
        self.visible.get_sorted(&self.pool);
        self.visible.records(&self.pool)
    }

    pub fn record(&self, identifier: &str) -> Option<&EntityRecord> {
        self.pool.get(identifier)
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn stats(&mut self) -> SyncStats {
        let visible = self.visible.get_sorted(&self.pool).len();
        let total_distance: f32 = self
            .visible
            .records(&self.pool)
            .map(EntityRecord::distance)
            .sum();
        let mut tier_counts = [0; LodLevel::COUNT];
        for record in self.pool.active_records() {
            tier_counts[record.lod().index()] += 1;
        }
        SyncStats {
            active: self.pool.active_count(),
            visible,
            utilization: self.pool.utilization(),
            mean_visible_distance: if visible == 0 {
                0.0
            } else {
                total_distance / visible as f32
            },
            tier_counts,
        }
    }

    // Interpolation

    /// Start the interpolation loop. Does nothing if it is already running.
    pub fn start(&mut self) {
        let now = self.now();
        if self.interpolator.start(now) {
            info!("sync engine started");
        }
    }

    /// Stop the interpolation loop. No interpolation happens until [`start`](Self::start).
    pub fn stop(&mut self) {
        if self.interpolator.stop() {
            info!("sync engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.interpolator.is_running()
    }

    pub fn tick(&mut self) -> Option<TickReport> {
        let now = self.now();
        self.interpolator.tick(&mut self.pool, now)
    }

    // Notifications

    pub fn add_listener(&mut self, listener: Callback) -> ListenerKey {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&mut self, key: ListenerKey) -> bool {
        self.notifier.remove_listener(key)
    }

    /// Queue a callback for the next batched flush. Returns false if it was already queued.
    pub fn schedule_batched(&mut self, callback: Callback) -> bool {
        self.batch.schedule(callback)
    }

    /// Run the listeners if the debounce window elapsed, and the batched callbacks if the rate
    /// limit allows it. Returns whether the listeners ran, and how many batched callbacks ran.
    pub fn flush_notifications(&mut self) -> (bool, usize) {
        let now = self.now();
        (self.notifier.poll(now), self.batch.flush(now))
    }

    // Staleness

    /// Release every record not heard from for more than `threshold`.
    pub fn sweep(&mut self, threshold: Duration) -> usize {
        let now = self.now();
        let removed = self.pool.release_stale(now, threshold);
        if removed > 0 {
            self.structure_changed(now);
        }
        removed
    }

    /// Run the sweep with the configured threshold if its interval elapsed
    pub fn sweep_if_due(&mut self) -> usize {
        let now = self.now();
        if !self.sweeper.is_due(now) {
            return 0;
        }
        let removed = self.sweeper.sweep(&mut self.pool, now);
        if removed > 0 {
            self.structure_changed(now);
        }
        removed
    }

    /// Run one frame: periodic sweep, classification, visible set, interpolation, then
    /// notifications.
    pub fn update(&mut self) -> UpdateReport {
        let swept = self.sweep_if_due();
        let tier_counts = self.classify();
        let visible = self.visible_sorted().len();
        #[cfg(feature = "metrics")]
        metrics::gauge!("crowdsync::visible::count").set(visible as f64);
        let tick = self.tick();
        let (notified, batched) = self.flush_notifications();
        UpdateReport {
            swept,
            tier_counts,
            visible,
            tick,
            notified,
            batched,
        }
    }
}
