//! Map types used across the workspace
//!
//! Keys are either short identifier strings or already-hashed integers, so the fixed hasher
//! from `bevy_platform` is enough and keeps iteration order stable between runs.

pub use bevy_platform::collections::HashMap;
