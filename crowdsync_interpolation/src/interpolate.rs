//! Smoothing of the live state of visible entities toward their latest target
//!
//! Every step moves a record's live position a fraction `rate = speed(lod) * dt` of the way to
//! its target, which converges exponentially at a rate that depends on how detailed the record
//! is rendered. A record flagged as moving that was heard from recently is also pushed along its
//! estimated velocity, damped, to hide the gap until the next update. Rotation takes the short
//! way around the circle; the live angle itself is never wrapped, so it can leave (-π, π] while
//! heading for a target on the other side of the seam.
//!
//! Hidden records are skipped entirely: their live state stays where it was until they come
//! back into range.
use bevy_math::Vec3;
use bevy_reflect::Reflect;
use core::f32::consts::{PI, TAU};
use core::time::Duration;
use crowdsync_core::lod::LodLevel;
use crowdsync_core::time::Timestamp;
use crowdsync_replication::pool::EntityPool;
use crowdsync_replication::record::EntityRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct InterpolationConfig {
    /// Approach speed per visible tier, indexed by [`LodLevel::index`]
    pub lod_speed: [f32; 3],
    /// Longest step taken in a single tick, so that a stalled frame does not teleport entities
    pub max_dt: Duration,
    /// Extrapolate only records seen within this window
    pub extrapolation_window: Duration,
    /// Fraction of the estimated velocity applied when extrapolating
    pub extrapolation_damping: f32,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            lod_speed: [12.0, 8.0, 4.0],
            max_dt: Duration::from_millis(100),
            extrapolation_window: Duration::from_millis(500),
            extrapolation_damping: 0.3,
        }
    }
}

impl InterpolationConfig {
    pub fn with_lod_speed(mut self, lod_speed: [f32; 3]) -> Self {
        self.lod_speed = lod_speed;
        self
    }

    pub fn with_max_dt(mut self, max_dt: Duration) -> Self {
        self.max_dt = max_dt;
        self
    }

    fn speed(&self, lod: LodLevel) -> Option<f32> {
        self.lod_speed.get(lod.index()).copied()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
}

/// Result of one interpolation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Step actually used, after clamping to [`InterpolationConfig::max_dt`]
    pub dt: Duration,
    /// Number of records whose live state was moved
    pub interpolated: usize,
}

/// Frame-driven interpolation loop.
///
/// The host forwards each frame to [`Interpolator::tick`]; while the scheduler is
/// [`SchedulerState::Stopped`] ticks are ignored, so stopping it halts all interpolation work
/// without the host having to unhook anything.
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
    config: InterpolationConfig,
    state: SchedulerState,
    last_tick: Option<Timestamp>,
}

impl Interpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Stopped,
            last_tick: None,
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Start the loop. Returns false if it was already running.
    pub fn start(&mut self, now: Timestamp) -> bool {
        if self.is_running() {
            return false;
        }
        debug!("interpolation started");
        self.state = SchedulerState::Running;
        self.last_tick = Some(now);
        true
    }

    /// Stop the loop. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        debug!("interpolation stopped");
        self.state = SchedulerState::Stopped;
        self.last_tick = None;
        true
    }

    /// Run one frame of interpolation, or nothing if the loop is stopped
    pub fn tick(&mut self, pool: &mut EntityPool, now: Timestamp) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }
        #[cfg(feature = "metrics")]
        let _timer = crowdsync_utils::metrics::TimerGauge::new("crowdsync::interpolation::tick");

        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        let dt = elapsed.min(self.config.max_dt);
        self.last_tick = Some(now);
        let interpolated = self.advance(pool, dt, now);
        Some(TickReport { dt, interpolated })
    }

    /// Step every visible record by `dt`, regardless of the scheduler state
    pub fn advance(&self, pool: &mut EntityPool, dt: Duration, now: Timestamp) -> usize {
        let mut interpolated = 0;
        for record in pool.active_records_mut() {
            if self.step(record, dt, now) {
                interpolated += 1;
            }
        }
        trace!(?dt, interpolated, "interpolation step");
        interpolated
    }

    fn step(&self, record: &mut EntityRecord, dt: Duration, now: Timestamp) -> bool {
        let Some(speed) = self.config.speed(record.lod()) else {
            return false;
        };
        let dt = dt.as_secs_f32();
        // past 1 the step would overshoot the target
        let rate = (speed * dt).clamp(0.0, 1.0);

        let mut position = record.position();
        position += (record.target_position() - position) * rate;
        if record.flags().is_moving()
            && now.saturating_sub(record.last_seen()) < self.config.extrapolation_window
        {
            let velocity = record.velocity();
            position +=
                Vec3::new(velocity.x, 0.0, velocity.z) * dt * self.config.extrapolation_damping;
        }

        // only the delta is wrapped: the live angle stays on the same turn as the target
        let delta = wrap_angle(record.target_rotation() - record.rotation());
        let rotation = record.rotation() + delta * rate;

        record.set_live(position, rotation, now);
        true
    }
}

/// Bring an angle that is at most one turn off back into (-π, π]
fn wrap_angle(angle: f32) -> f32 {
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}
