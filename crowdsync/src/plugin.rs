//! Driving a [`SyncEngine`] from a bevy [`App`]
use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use tracing::trace;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SyncSet {
    /// Release stale records, then compute the distance and LOD of every record
    Classify,
    /// Move the rendered state of visible records toward their targets
    Interpolate,
    /// Run the debounced listeners and batched callbacks
    Flush,
}

/// Inserts a [`SyncEngine`] resource and runs it every frame in [`Update`].
///
/// If the app already contains a [`SyncEngine`] (for example one built with a custom clock),
/// it is used as is and `config` is ignored.
///
/// Systems that feed remote state into the engine should run before [`SyncSet::Classify`];
/// systems that render the visible set should run after [`SyncSet::Interpolate`].
#[derive(Debug, Clone)]
pub struct SyncPlugin {
    pub config: SyncConfig,
    /// Start the interpolation loop at [`Startup`]
    pub autostart: bool,
}

impl Default for SyncPlugin {
    fn default() -> Self {
        Self {
            config: SyncConfig::default(),
            autostart: true,
        }
    }
}

impl SyncPlugin {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

fn start(mut engine: ResMut<SyncEngine>) {
    engine.start();
}

fn classify(mut engine: ResMut<SyncEngine>) {
    let swept = engine.sweep_if_due();
    let counts = engine.classify();
    trace!(swept, ?counts, "classify");
}

fn interpolate(mut engine: ResMut<SyncEngine>) {
    engine.tick();
}

fn flush(mut engine: ResMut<SyncEngine>) {
    engine.flush_notifications();
}

impl Plugin for SyncPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SyncEngine>() {
            app.insert_resource(SyncEngine::new(self.config));
        }
        app.configure_sets(
            Update,
            (SyncSet::Classify, SyncSet::Interpolate, SyncSet::Flush).chain(),
        );
        app.add_systems(
            Update,
            (
                classify.in_set(SyncSet::Classify),
                interpolate.in_set(SyncSet::Interpolate),
                flush.in_set(SyncSet::Flush),
            ),
        );
        if self.autostart {
            app.add_systems(Startup, start);
        }
    }
}
