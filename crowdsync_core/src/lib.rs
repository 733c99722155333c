//! Contains a set of shared types

pub mod flags;
pub mod id;
pub mod lod;
pub mod time;
pub mod update;

pub mod prelude {
    pub use crate::flags::StateFlags;
    pub use crate::id::{IdentityHash, identity_hash};
    pub use crate::lod::LodLevel;
    pub use crate::time::{Clock, ManualClock, SystemClock, Timestamp};
    pub use crate::update::{
        BATCH_HEADER_LEN, RECORD_LEN, StateUpdate, decode_batch, decode_batch_into, encode_batch,
        encode_batch_into,
    };
}
