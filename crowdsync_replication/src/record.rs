//! One tracked remote participant
use bevy_math::Vec3;
use core::time::Duration;
use crowdsync_core::flags::StateFlags;
use crowdsync_core::id::IdentityHash;
use crowdsync_core::lod::LodLevel;
use crowdsync_core::time::Timestamp;
use crowdsync_core::update::StateUpdate;
use serde::{Deserialize, Serialize};

/// Distance epoch that no classification pass ever uses
pub const INVALID_EPOCH: u64 = 0;

/// Indices into the fixed cosmetic palettes of the client
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Appearance {
    pub archetype: u8,
    pub skin: u8,
    pub shirt: u8,
    pub pants: u8,
    pub accessory: u8,
}

/// Slow-changing presentation data, received out of band from the state stream
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub display_name: String,
    pub appearance: Appearance,
}

/// A slot of the [`EntityPool`](crate::pool::EntityPool).
///
/// The `target_*` fields hold the latest state received from the network. The live fields
/// ([`position`](Self::position), [`rotation`](Self::rotation)) hold the value being rendered
/// and are only moved by interpolation, through [`EntityRecord::set_live`].
///
/// `distance` and `lod` are a cache filled by the LOD classifier. They are only meaningful for
/// the epoch they were computed in; moving the live position resets the record's epoch so that
/// [`EntityRecord::distance_in`] reports them as stale.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    slot: usize,
    active: bool,
    identifier: String,
    hash: IdentityHash,
    display_name: String,
    appearance: Appearance,

    position: Vec3,
    target_position: Vec3,
    velocity: Vec3,
    rotation: f32,
    target_rotation: f32,
    flags: StateFlags,
    /// False until the first state update after the slot was bound
    has_target: bool,

    last_seen: Timestamp,
    last_interpolated: Timestamp,

    distance: f32,
    lod: LodLevel,
    distance_epoch: u64,
}

impl EntityRecord {
    pub(crate) fn empty(slot: usize) -> Self {
        Self {
            slot,
            active: false,
            identifier: String::new(),
            hash: 0,
            display_name: String::new(),
            appearance: Appearance::default(),
            position: Vec3::ZERO,
            target_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            target_rotation: 0.0,
            flags: StateFlags::empty(),
            has_target: false,
            last_seen: Duration::ZERO,
            last_interpolated: Duration::ZERO,
            distance: f32::INFINITY,
            lod: LodLevel::Hidden,
            distance_epoch: INVALID_EPOCH,
        }
    }

    /// Bind a free slot to a participant.
    ///
    /// The string buffers keep their capacity; the numeric state is left as is and overwritten
    /// by the first update.
    pub(crate) fn bind(&mut self, identifier: &str, hash: IdentityHash, now: Timestamp) {
        self.active = true;
        self.identifier.clear();
        self.identifier.push_str(identifier);
        self.hash = hash;
        self.display_name.clear();
        self.appearance = Appearance::default();
        self.flags = StateFlags::empty();
        self.velocity = Vec3::ZERO;
        self.has_target = false;
        self.last_seen = now;
        self.last_interpolated = now;
        self.lod = LodLevel::Hidden;
        self.distance = f32::INFINITY;
        self.distance_epoch = INVALID_EPOCH;
    }

    pub(crate) fn unbind(&mut self) {
        self.active = false;
        self.identifier.clear();
        self.lod = LodLevel::Hidden;
        self.distance_epoch = INVALID_EPOCH;
    }

    /// Write a received state update into the target fields.
    ///
    /// The first update after binding also snaps the live state onto the target, so that a
    /// newcomer appears in place instead of sliding in from whatever the slot held before.
    pub fn apply_update(&mut self, update: &StateUpdate, now: Timestamp) {
        if self.has_target {
            let elapsed = update
                .timestamp_delta()
                .unwrap_or_else(|| now.saturating_sub(self.last_seen));
            if !elapsed.is_zero() {
                self.velocity = (update.position - self.target_position) / elapsed.as_secs_f32();
            }
        } else {
            self.set_live(update.position, update.rotation, now);
            self.velocity = Vec3::ZERO;
            self.has_target = true;
        }
        self.target_position = update.position;
        self.target_rotation = update.rotation;
        self.flags = update.flags;
        self.last_seen = now;
    }

    pub fn apply_profile(&mut self, profile: &EntityProfile) {
        self.display_name.clear();
        self.display_name.push_str(&profile.display_name);
        self.appearance = profile.appearance;
    }

    /// Move the rendered state. This invalidates the cached distance.
    pub fn set_live(&mut self, position: Vec3, rotation: f32, now: Timestamp) {
        self.position = position;
        self.rotation = rotation;
        self.last_interpolated = now;
        self.distance_epoch = INVALID_EPOCH;
    }

    /// Store the result of a classification pass for `epoch`
    pub fn set_classification(&mut self, distance: f32, lod: LodLevel, epoch: u64) {
        self.distance = distance;
        self.lod = lod;
        self.distance_epoch = epoch;
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn hash(&self) -> IdentityHash {
        self.hash
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    /// Live (rendered) position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    /// Velocity estimated from the last two updates, in units per second
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Live (rendered) rotation
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn target_rotation(&self) -> f32 {
        self.target_rotation
    }

    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    pub fn has_target(&self) -> bool {
        self.has_target
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    pub fn last_interpolated(&self) -> Timestamp {
        self.last_interpolated
    }

    /// Distance from the last classification pass, whether or not it is still current
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// LOD from the last classification pass
    pub fn lod(&self) -> LodLevel {
        self.lod
    }

    /// Cached distance, only if it was computed during `epoch` and nothing moved since
    pub fn distance_in(&self, epoch: u64) -> Option<f32> {
        (epoch != INVALID_EPOCH && self.distance_epoch == epoch).then_some(self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_log::test;

    fn bound_record() -> EntityRecord {
        let mut record = EntityRecord::empty(3);
        record.bind("alice", 42, Duration::from_secs(1));
        record
    }

    #[test]
    fn test_first_update_snaps_live_state() {
        let mut record = bound_record();
        let update = StateUpdate::new(42, Vec3::new(5.0, 1.0, -3.0), 1.5);
        record.apply_update(&update, Duration::from_secs(1));

        assert!(record.has_target());
        assert_eq!(record.position(), Vec3::new(5.0, 1.0, -3.0));
        assert_eq!(record.target_position(), Vec3::new(5.0, 1.0, -3.0));
        assert_eq!(record.rotation(), 1.5);
        assert_eq!(record.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_later_updates_leave_live_state() {
        let mut record = bound_record();
        record.apply_update(&StateUpdate::new(42, Vec3::ZERO, 0.0), Duration::from_secs(1));
        record.apply_update(
            &StateUpdate::new(42, Vec3::new(2.0, 0.0, 0.0), 0.5),
            Duration::from_millis(1500),
        );
        assert_eq!(record.position(), Vec3::ZERO);
        assert_eq!(record.rotation(), 0.0);
        assert_eq!(record.target_position(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(record.last_seen(), Duration::from_millis(1500));
    }

    #[test]
    fn test_velocity_prefers_sender_delta() {
        let mut record = bound_record();
        record.apply_update(&StateUpdate::new(42, Vec3::ZERO, 0.0), Duration::from_secs(1));

        // 1 unit in 100ms according to the sender, even though 500ms passed locally
        let update = StateUpdate::new(42, Vec3::new(1.0, 0.0, 0.0), 0.0)
            .with_timestamp_delta(Duration::from_millis(100));
        record.apply_update(&update, Duration::from_millis(1500));
        assert_relative_eq!(record.velocity().x, 10.0, epsilon = 1e-4);

        // without a sender delta we fall back to local time since last seen
        let update = StateUpdate::new(42, Vec3::new(2.0, 0.0, 0.0), 0.0);
        record.apply_update(&update, Duration::from_millis(2000));
        assert_relative_eq!(record.velocity().x, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_elapsed_keeps_velocity() {
        let mut record = bound_record();
        record.apply_update(&StateUpdate::new(42, Vec3::ZERO, 0.0), Duration::from_secs(1));
        record.apply_update(
            &StateUpdate::new(42, Vec3::new(1.0, 0.0, 0.0), 0.0),
            Duration::from_millis(1500),
        );
        let velocity = record.velocity();
        // duplicate delivery in the same instant
        record.apply_update(
            &StateUpdate::new(42, Vec3::new(1.0, 0.0, 0.0), 0.0),
            Duration::from_millis(1500),
        );
        assert_eq!(record.velocity(), velocity);
    }

    #[test]
    fn test_moving_live_state_invalidates_distance() {
        let mut record = bound_record();
        record.set_classification(12.0, LodLevel::Full, 7);
        assert_eq!(record.distance_in(7), Some(12.0));
        assert_eq!(record.distance_in(8), None);

        record.set_live(Vec3::ONE, 0.0, Duration::from_secs(2));
        assert_eq!(record.distance_in(7), None);
        // the stale values are still readable
        assert_eq!(record.lod(), LodLevel::Full);
        assert_eq!(record.last_interpolated(), Duration::from_secs(2));
    }

    #[test]
    fn test_rebind_clears_previous_participant() {
        let mut record = bound_record();
        record.apply_profile(&EntityProfile {
            display_name: "Alice".into(),
            appearance: Appearance {
                skin: 2,
                ..Default::default()
            },
        });
        record.apply_update(
            &StateUpdate::new(42, Vec3::ONE, 0.0).with_flags(StateFlags::SITTING),
            Duration::from_secs(1),
        );
        record.unbind();
        assert!(!record.is_active());

        record.bind("bob", 7, Duration::from_secs(9));
        assert_eq!(record.identifier(), "bob");
        assert_eq!(record.display_name(), "");
        assert_eq!(record.appearance(), Appearance::default());
        assert_eq!(record.flags(), StateFlags::empty());
        assert!(!record.has_target());
        assert_eq!(record.lod(), LodLevel::Hidden);
    }
}
