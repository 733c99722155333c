/*! # crowdsync

Client-side state synchronization for shared spaces with many remote participants.

The crate ingests compact 18-byte state records from the network, keeps every remote
participant in a fixed-capacity pool, classifies them by distance to the local observer into
levels of detail, exposes the closest visible ones sorted by distance, and smooths their
rendered state between updates.

The [`SyncEngine`](engine::SyncEngine) ties the pieces together and is usable from plain Rust;
[`SyncPlugin`](plugin::SyncPlugin) drives it from a bevy `App`.

```rust
use crowdsync::prelude::*;
use bevy_math::Vec3;

let mut engine = SyncEngine::new(SyncConfig::default());
let update = StateUpdate::new(identity_hash("alice"), Vec3::new(3.0, 0.0, 4.0), 0.0);
engine.apply_remote_update("alice", &update).unwrap();
engine.start();
engine.update();
assert_eq!(engine.visible_records().count(), 1);
```
*/

pub mod config;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod stats;

pub use crowdsync_core as shared;
pub use crowdsync_interpolation as interpolation;
pub use crowdsync_notify as notify;
pub use crowdsync_replication as replication;

pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::engine::{SyncEngine, UpdateReport};
    pub use crate::error::SyncError;
    pub use crate::plugin::{SyncPlugin, SyncSet};
    pub use crate::stats::SyncStats;

    pub use crowdsync_core::prelude::*;
    pub use crowdsync_interpolation::prelude::*;
    pub use crowdsync_notify::prelude::*;
    pub use crowdsync_replication::prelude::*;
    pub use crowdsync_serde::SerializationError;
}
