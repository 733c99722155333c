use bevy_reflect::Reflect;
use crowdsync_interpolation::interpolate::InterpolationConfig;
use crowdsync_interpolation::lod::LodThresholds;
use crowdsync_notify::NotifierConfig;
use crowdsync_replication::pool::PoolConfig;
use crowdsync_replication::sweep::SweepConfig;
use serde::{Deserialize, Serialize};

/// Configuration of a [`SyncEngine`](crate::engine::SyncEngine)
///
/// Missing fields take their default value when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SyncConfig {
    pub pool: PoolConfig,
    pub lod: LodThresholds,
    /// Maximum number of records in the visible set
    pub visible_capacity: usize,
    pub interpolation: InterpolationConfig,
    pub notifier: NotifierConfig,
    pub sweep: SweepConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            lod: LodThresholds::default(),
            visible_capacity: 50,
            interpolation: InterpolationConfig::default(),
            notifier: NotifierConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_lod(mut self, lod: LodThresholds) -> Self {
        self.lod = lod;
        self
    }

    pub fn with_visible_capacity(mut self, visible_capacity: usize) -> Self {
        self.visible_capacity = visible_capacity;
        self
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationConfig) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_notifier(mut self, notifier: NotifierConfig) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use crowdsync_replication::pool::ExhaustionPolicy;
    use test_log::test;

    #[test]
    fn test_reference_values() {
        let config = SyncConfig::default();
        assert_eq!(config.pool.capacity, 150);
        assert_eq!(config.visible_capacity, 50);
        assert_eq!(config.lod.full, 30.0);
        assert_eq!(config.interpolation.lod_speed, [12.0, 8.0, 4.0]);
        assert_eq!(config.notifier.debounce, Duration::from_millis(32));
        assert_eq!(config.sweep.threshold, Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "visible_capacity": 20,
            "pool": { "capacity": 64, "exhaustion": "EvictLeastRecentlySeen" }
        }"#;
        let config: SyncConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.visible_capacity, 20);
        assert_eq!(config.pool.capacity, 64);
        assert_eq!(config.pool.exhaustion, ExhaustionPolicy::EvictLeastRecentlySeen);
        assert_eq!(config.lod, LodThresholds::default());
        assert_eq!(config.sweep, SweepConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SyncConfig::default().with_visible_capacity(10);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<SyncConfig>(&json).unwrap(), config);
    }
}
