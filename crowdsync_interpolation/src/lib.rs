//! Level of detail and interpolation of remote entities
//!
//! Each frame the host:
//! 1. runs the [`LodClassifier`](lod::LodClassifier) once, which caches every record's planar
//!    distance to the local observer and its [`LodLevel`](crowdsync_core::lod::LodLevel);
//! 2. reads the [`VisibleSet`](visible::VisibleSet), the closest visible records sorted by
//!    distance, recomputed only when invalidated;
//! 3. ticks the [`Interpolator`](interpolate::Interpolator), which moves the live state of every
//!    visible record toward its latest target at a rate that depends on its LOD.

pub mod interpolate;
pub mod lod;
pub mod visible;

pub mod prelude {
    pub use crate::interpolate::{InterpolationConfig, Interpolator, SchedulerState, TickReport};
    pub use crate::lod::{LodClassifier, LodCounts, LodThresholds};
    pub use crate::visible::VisibleSet;
}
