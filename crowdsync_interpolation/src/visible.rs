//! Cache of the closest visible entities
use crowdsync_replication::pool::EntityPool;
use crowdsync_replication::record::EntityRecord;
use tracing::trace;

/// Slots of the `capacity` closest records whose LOD is visible, ascending by distance.
///
/// The set is recomputed lazily: [`VisibleSet::get_sorted`] only rebuilds it after
/// [`VisibleSet::invalidate`] was called, and otherwise hands back the cached slice. Callers
/// invalidate it whenever the LOD classification ran or the pool gained or lost a member.
///
/// The sort is stable, so records at the same distance keep their slot order.
#[derive(Debug, Clone)]
pub struct VisibleSet {
    capacity: usize,
    slots: Vec<usize>,
    stale: bool,
    /// Incremented on every rebuild
    generation: u64,
}

impl Default for VisibleSet {
    fn default() -> Self {
        Self::new(50)
    }
}

impl VisibleSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            stale: true,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Return the sorted visible slots, rebuilding them first if the cache is stale
    pub fn get_sorted(&mut self, pool: &EntityPool) -> &[usize] {
        if self.stale {
            self.rebuild(pool);
        }
        &self.slots
    }

    /// Records of the cached set, in distance order
    pub fn records<'a>(&'a self, pool: &'a EntityPool) -> impl Iterator<Item = &'a EntityRecord> {
        self.slots.iter().filter_map(|slot| pool.slot(*slot))
    }

    fn rebuild(&mut self, pool: &EntityPool) {
        self.slots.clear();
        // the scratch buffer can briefly hold every visible record before truncation
        self.slots.reserve(pool.active_count());
        self.slots.extend(
            pool.active_records()
                .filter(|record| record.lod().is_visible())
                .map(EntityRecord::slot),
        );
        self.slots.sort_by(|a, b| {
            let a = pool.slot(*a).map_or(f32::INFINITY, EntityRecord::distance);
            let b = pool.slot(*b).map_or(f32::INFINITY, EntityRecord::distance);
            a.total_cmp(&b)
        });
        self.slots.truncate(self.capacity);
        self.stale = false;
        self.generation += 1;
        trace!(
            generation = self.generation,
            len = self.slots.len(),
            "rebuilt visible set"
        );
    }
}
