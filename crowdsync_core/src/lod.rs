use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

/// Level of detail of a remote entity, from its planar distance to the local observer
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Reflect,
)]
#[repr(u8)]
pub enum LodLevel {
    Full = 0,
    Medium = 1,
    Low = 2,
    /// Too far away to be rendered or interpolated
    #[default]
    Hidden = 3,
}

impl LodLevel {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_visible(self) -> bool {
        self != LodLevel::Hidden
    }
}
