use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Packed movement state of a participant, sent as a single byte
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StateFlags: u8 {
        const MOVING = 1 << 0;
        const DRIVING = 1 << 1;
        const SITTING = 1 << 2;
    }
}

impl StateFlags {
    pub fn is_moving(&self) -> bool {
        self.contains(StateFlags::MOVING)
    }

    pub fn is_driving(&self) -> bool {
        self.contains(StateFlags::DRIVING)
    }

    pub fn is_sitting(&self) -> bool {
        self.contains(StateFlags::SITTING)
    }
}
