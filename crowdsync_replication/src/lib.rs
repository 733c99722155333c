//! Storage of remote entities and the paths that write into it
//!
//! Remote participants live in an [`EntityPool`](pool::EntityPool): a fixed arena of
//! [`EntityRecord`](record::EntityRecord)s allocated once at startup. State updates from the
//! transport are written into the record's target fields by the [`receive`] module, the
//! interpolation crate moves the live fields toward them, and [`sweep`] reclaims records whose
//! sender went quiet.

pub mod error;
pub mod pool;
pub mod receive;
pub mod record;
pub mod sweep;

pub mod prelude {
    pub use crate::error::PoolError;
    pub use crate::pool::{AcquireStatus, Acquired, EntityPool, ExhaustionPolicy, PoolConfig};
    pub use crate::receive::IngressReport;
    pub use crate::record::{Appearance, EntityProfile, EntityRecord};
    pub use crate::sweep::{StalenessSweeper, SweepConfig};
}
