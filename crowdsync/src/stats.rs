use crowdsync_core::lod::LodLevel;

/// Snapshot of the engine state, for debug overlays and telemetry
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SyncStats {
    /// Bound records in the pool
    pub active: usize,
    /// Records in the visible set
    pub visible: usize,
    /// `active / capacity`
    pub utilization: f32,
    /// Mean distance to the observer over the visible set, 0 when it is empty
    pub mean_visible_distance: f32,
    /// Active records per [`LodLevel`], indexed by [`LodLevel::index`]
    pub tier_counts: [usize; LodLevel::COUNT],
}

impl SyncStats {
    pub fn tier(&self, lod: LodLevel) -> usize {
        self.tier_counts[lod.index()]
    }
}
