//! Planar distance classification against the local observer
use bevy_math::{Vec2, Vec3};
use bevy_reflect::Reflect;
use crowdsync_core::lod::LodLevel;
use crowdsync_replication::pool::EntityPool;
use crowdsync_replication::record::INVALID_EPOCH;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Upper distance bounds (inclusive) of each visible tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct LodThresholds {
    pub full: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            full: 30.0,
            medium: 60.0,
            low: 100.0,
        }
    }
}

impl LodThresholds {
    pub fn level(&self, distance: f32) -> LodLevel {
        if distance <= self.full {
            LodLevel::Full
        } else if distance <= self.medium {
            LodLevel::Medium
        } else if distance <= self.low {
            LodLevel::Low
        } else {
            LodLevel::Hidden
        }
    }
}

/// Number of records in each tier after a classification pass, indexed by [`LodLevel::index`]
pub type LodCounts = [usize; LodLevel::COUNT];

/// Assigns a [`LodLevel`] to every record of the pool.
///
/// Classification is an explicit O(n) pass, meant to run once per frame. Every pass starts a new
/// distance epoch; moving the observer also starts one, so cached distances from before the move
/// read as stale until the next pass.
#[derive(Debug, Clone)]
pub struct LodClassifier {
    thresholds: LodThresholds,
    observer: Vec3,
    epoch: u64,
}

impl Default for LodClassifier {
    fn default() -> Self {
        Self::new(LodThresholds::default())
    }
}

impl LodClassifier {
    pub fn new(thresholds: LodThresholds) -> Self {
        Self {
            thresholds,
            observer: Vec3::ZERO,
            epoch: INVALID_EPOCH,
        }
    }

    pub fn thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }

    pub fn observer(&self) -> Vec3 {
        self.observer
    }

    /// Current distance epoch, see [`EntityRecord::distance_in`](crowdsync_replication::record::EntityRecord::distance_in)
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn set_observer(&mut self, observer: Vec3) {
        if observer != self.observer {
            self.observer = observer;
            self.epoch += 1;
        }
    }

    /// Distance on the ground plane: height is ignored
    pub fn planar_distance(&self, position: Vec3) -> f32 {
        Vec2::new(position.x - self.observer.x, position.z - self.observer.z).length()
    }

    pub fn classify(&mut self, pool: &mut EntityPool) -> LodCounts {
        self.epoch += 1;
        let mut counts = LodCounts::default();
        for record in pool.active_records_mut() {
            // the live position of a record that never got a state is whatever the slot last held
            if !record.has_target() {
                record.set_classification(f32::INFINITY, LodLevel::Hidden, self.epoch);
                counts[LodLevel::Hidden.index()] += 1;
                continue;
            }
            let distance = self.planar_distance(record.position());
            let lod = self.thresholds.level(distance);
            record.set_classification(distance, lod, self.epoch);
            counts[lod.index()] += 1;
        }
        trace!(epoch = self.epoch, ?counts, "classified entities");
        counts
    }
}
