//! Reclaiming records of participants that stopped sending updates
use crate::pool::EntityPool;
use bevy_reflect::Reflect;
use core::time::Duration;
use crowdsync_core::time::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct SweepConfig {
    /// A record is stale once this long has passed since its last update
    pub threshold: Duration,
    /// How often the periodic sweep runs
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(10),
            interval: Duration::from_secs(5),
        }
    }
}

impl SweepConfig {
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl EntityPool {
    /// Release every record not heard from for more than `threshold`.
    ///
    /// Returns how many records were released.
    pub fn release_stale(&mut self, now: Timestamp, threshold: Duration) -> usize {
        let mut removed = 0;
        for slot in 0..self.capacity() {
            let Some(record) = self.slot(slot) else {
                continue;
            };
            if now.saturating_sub(record.last_seen()) > threshold {
                debug!(
                    identifier = ?record.identifier(),
                    last_seen = ?record.last_seen(),
                    "releasing stale entity"
                );
                self.release_slot(slot);
                removed += 1;
            }
        }
        removed
    }
}

/// Coarse timer that decides when the periodic sweep is due
#[derive(Debug, Clone)]
pub struct StalenessSweeper {
    config: SweepConfig,
    last_sweep: Option<Timestamp>,
}

impl StalenessSweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            last_sweep: None,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// True if at least one interval passed since the last sweep.
    ///
    /// The first call only arms the timer.
    pub fn is_due(&mut self, now: Timestamp) -> bool {
        match self.last_sweep {
            None => {
                self.last_sweep = Some(now);
                false
            }
            Some(last) => now.saturating_sub(last) >= self.config.interval,
        }
    }

    /// Run a sweep with the configured threshold
    pub fn sweep(&mut self, pool: &mut EntityPool, now: Timestamp) -> usize {
        self.last_sweep = Some(now);
        pool.release_stale(now, self.config.threshold)
    }
}
