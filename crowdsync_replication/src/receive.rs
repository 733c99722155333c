//! Ingress of remote state into the pool
use crate::error::Result;
use crate::pool::{Acquired, EntityPool};
use crate::record::EntityProfile;
use crowdsync_core::time::Timestamp;
use crowdsync_core::update::StateUpdate;
use tracing::trace;

/// Outcome of applying a decoded batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngressReport {
    /// Records written into the pool
    pub applied: usize,
    /// Records whose hash is not bound to any identifier, and were skipped
    pub unknown: usize,
}

impl EntityPool {
    /// Write a remote update for `identifier`, binding a slot if it is new.
    ///
    /// Only the target fields, the flags and the last-seen time are written; the live state is
    /// left for interpolation to catch up (except for a brand new record, see
    /// [`EntityRecord::apply_update`](crate::record::EntityRecord::apply_update)).
    pub fn apply_remote_update(
        &mut self,
        identifier: &str,
        update: &StateUpdate,
        now: Timestamp,
    ) -> Result<Acquired> {
        let acquired = self.acquire(identifier, now)?;
        if let Some(record) = self.slot_mut(acquired.slot) {
            record.apply_update(update, now);
        }
        Ok(acquired)
    }

    /// Route a wire record to its entity through the hash map.
    ///
    /// Returns the slot that was updated, or `None` if nobody with that hash is tracked. Wire
    /// records never bind new slots: participants are introduced by identifier.
    pub fn apply_wire_update(&mut self, update: &StateUpdate, now: Timestamp) -> Option<usize> {
        let Some(record) = self.lookup_by_hash_mut(update.hash) else {
            trace!(hash = update.hash, "state update for an unknown identity");
            return None;
        };
        record.apply_update(update, now);
        Some(record.slot())
    }

    /// Apply every record of a decoded batch
    pub fn apply_wire_batch(&mut self, updates: &[StateUpdate], now: Timestamp) -> IngressReport {
        let mut report = IngressReport::default();
        for update in updates {
            match self.apply_wire_update(update, now) {
                Some(_) => report.applied += 1,
                None => report.unknown += 1,
            }
        }
        report
    }

    /// Store the display name and appearance of `identifier`, binding a slot if it is new
    pub fn apply_profile(
        &mut self,
        identifier: &str,
        profile: &EntityProfile,
        now: Timestamp,
    ) -> Result<Acquired> {
        let acquired = self.acquire(identifier, now)?;
        if let Some(record) = self.slot_mut(acquired.slot) {
            record.apply_profile(profile);
        }
        Ok(acquired)
    }
}
