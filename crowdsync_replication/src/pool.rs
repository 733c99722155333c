//! Fixed-capacity arena of [`EntityRecord`]s
//!
//! Every record is allocated when the pool is built; joining and leaving participants only bind
//! and unbind slots. Two maps index the arena:
//! - identifier -> slot, used by the presence/ingress API
//! - identity hash -> slot, used to route wire records, which only carry the hash
//!
//! Both are updated together on bind and unbind, so a hash resolves if and only if its
//! identifier does.
use crate::error::{PoolError, Result};
use crate::record::EntityRecord;
use bevy_reflect::Reflect;
use crowdsync_core::id::{IdentityHash, identity_hash};
use crowdsync_core::time::Timestamp;
use crowdsync_utils::collections::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// What to do when a new participant arrives while every slot is bound
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum ExhaustionPolicy {
    /// Refuse the newcomer with [`PoolError::Exhausted`]
    #[default]
    Reject,
    /// Release the participant that has gone the longest without an update, and bind the
    /// newcomer in its slot
    EvictLeastRecentlySeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct PoolConfig {
    /// Maximum number of simultaneously tracked remote participants
    pub capacity: usize,
    pub exhaustion: ExhaustionPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 150,
            exhaustion: ExhaustionPolicy::Reject,
        }
    }
}

impl PoolConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_exhaustion(mut self, exhaustion: ExhaustionPolicy) -> Self {
        self.exhaustion = exhaustion;
        self
    }
}

/// How [`EntityPool::acquire`] obtained its slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireStatus {
    /// The identifier was already bound
    Existing,
    /// A free slot was bound to the identifier
    Bound,
    /// The pool was full and `evicted` was released to make room
    Replaced { evicted: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub slot: usize,
    pub status: AcquireStatus,
}

impl Acquired {
    /// True if the identifier was not tracked before this call
    pub fn is_new(&self) -> bool {
        !matches!(self.status, AcquireStatus::Existing)
    }
}

#[derive(Debug)]
pub struct EntityPool {
    records: Vec<EntityRecord>,
    by_identifier: HashMap<String, usize>,
    by_hash: HashMap<IdentityHash, usize>,
    /// Next slot to try when binding, so that slots are reused round-robin
    cursor: usize,
    active: usize,
    policy: ExhaustionPolicy,
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl EntityPool {
    pub fn new(config: PoolConfig) -> Self {
        let capacity = config.capacity;
        Self {
            records: (0..capacity).map(EntityRecord::empty).collect(),
            by_identifier: HashMap::with_capacity_and_hasher(capacity, Default::default()),
            by_hash: HashMap::with_capacity_and_hasher(capacity, Default::default()),
            cursor: 0,
            active: 0,
            policy: config.exhaustion,
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Fraction of the slots currently bound, in `[0, 1]`
    pub fn utilization(&self) -> f32 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.active as f32 / self.records.len() as f32
    }

    /// Find or bind the record for `identifier`.
    ///
    /// Idempotent: acquiring an identifier that is already bound returns its slot and changes
    /// nothing. Fails without touching any record if the pool is full (under
    /// [`ExhaustionPolicy::Reject`]) or if the identifier's hash is held by another identifier.
    pub fn acquire(&mut self, identifier: &str, now: Timestamp) -> Result<Acquired> {
        if let Some(&slot) = self.by_identifier.get(identifier) {
            return Ok(Acquired {
                slot,
                status: AcquireStatus::Existing,
            });
        }

        let hash = identity_hash(identifier);
        if let Some(&slot) = self.by_hash.get(&hash) {
            let existing = self.records[slot].identifier().to_owned();
            warn!(
                ?identifier,
                ?existing,
                hash,
                "identity hash collision, refusing to bind"
            );
            return Err(PoolError::HashCollision { hash, existing });
        }

        let (slot, status) = match self.find_free_slot() {
            Some(slot) => (slot, AcquireStatus::Bound),
            None => match self.policy {
                ExhaustionPolicy::Reject => {
                    warn!(?identifier, capacity = self.capacity(), "entity pool exhausted");
                    return Err(PoolError::Exhausted {
                        capacity: self.capacity(),
                    });
                }
                ExhaustionPolicy::EvictLeastRecentlySeen => {
                    let Some(slot) = self.least_recently_seen() else {
                        // only reachable with a zero-capacity pool
                        return Err(PoolError::Exhausted {
                            capacity: self.capacity(),
                        });
                    };
                    let evicted = self.records[slot].identifier().to_owned();
                    debug!(?evicted, ?identifier, slot, "evicting least recently seen entity");
                    self.release_slot(slot);
                    (slot, AcquireStatus::Replaced { evicted })
                }
            },
        };

        self.records[slot].bind(identifier, hash, now);
        self.by_identifier.insert(identifier.to_owned(), slot);
        self.by_hash.insert(hash, slot);
        self.active += 1;
        self.cursor = (slot + 1) % self.capacity();
        debug!(?identifier, hash, slot, active = self.active, "bound entity");
        Ok(Acquired { slot, status })
    }

    /// Unbind `identifier`. Returns false if it was not bound.
    pub fn release(&mut self, identifier: &str) -> bool {
        let Some(&slot) = self.by_identifier.get(identifier) else {
            trace!(?identifier, "release of an unknown identifier");
            return false;
        };
        self.release_slot(slot);
        debug!(?identifier, slot, active = self.active, "released entity");
        true
    }

    pub(crate) fn release_slot(&mut self, slot: usize) {
        let record = &mut self.records[slot];
        if !record.is_active() {
            return;
        }
        self.by_identifier.remove(record.identifier());
        self.by_hash.remove(&record.hash());
        record.unbind();
        self.active -= 1;
    }

    fn find_free_slot(&self) -> Option<usize> {
        let capacity = self.capacity();
        if self.active >= capacity {
            return None;
        }
        (0..capacity)
            .map(|offset| (self.cursor + offset) % capacity)
            .find(|&slot| !self.records[slot].is_active())
    }

    fn least_recently_seen(&self) -> Option<usize> {
        self.active_records()
            .min_by_key(|record| record.last_seen())
            .map(EntityRecord::slot)
    }

    pub fn get(&self, identifier: &str) -> Option<&EntityRecord> {
        self.by_identifier
            .get(identifier)
            .map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut EntityRecord> {
        self.by_identifier
            .get(identifier)
            .map(|&slot| &mut self.records[slot])
    }

    /// Record at `slot`, only if that slot is bound
    pub fn slot(&self, slot: usize) -> Option<&EntityRecord> {
        self.records.get(slot).filter(|record| record.is_active())
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut EntityRecord> {
        self.records.get_mut(slot).filter(|record| record.is_active())
    }

    /// Resolve a wire hash. Unknown hashes return `None`.
    pub fn lookup_by_hash(&self, hash: IdentityHash) -> Option<&EntityRecord> {
        self.by_hash.get(&hash).map(|&slot| &self.records[slot])
    }

    pub fn lookup_by_hash_mut(&mut self, hash: IdentityHash) -> Option<&mut EntityRecord> {
        self.by_hash.get(&hash).map(|&slot| &mut self.records[slot])
    }

    /// Resolve a wire hash and require the record to belong to `identifier`.
    ///
    /// Useful when the transport also knows the sender, to rule out a collision.
    pub fn lookup_by_hash_checked(
        &self,
        hash: IdentityHash,
        identifier: &str,
    ) -> Option<&EntityRecord> {
        self.lookup_by_hash(hash)
            .filter(|record| record.identifier() == identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    /// Bound records in slot order
    pub fn active_records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter().filter(|record| record.is_active())
    }

    pub fn active_records_mut(&mut self) -> impl Iterator<Item = &mut EntityRecord> {
        self.records.iter_mut().filter(|record| record.is_active())
    }

    /// Identifiers of every bound record
    pub fn active_identifiers(&self) -> Vec<String> {
        self.active_records()
            .map(|record| record.identifier().to_owned())
            .collect()
    }
}
