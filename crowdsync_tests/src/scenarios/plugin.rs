//! Running the engine inside a headless bevy app
use approx::assert_relative_eq;
use bevy_app::prelude::*;
use bevy_math::Vec3;
use core::time::Duration;
use crowdsync::prelude::*;
use bevy_platform::sync::Arc;
use bevy_platform::sync::atomic::{AtomicUsize, Ordering};
use test_log::test;

fn app_with_clock(plugin: SyncPlugin) -> (App, ManualClock) {
    let clock = ManualClock::new();
    let mut app = App::new();
    app.insert_resource(SyncEngine::with_clock(SyncConfig::default(), clock.clone()));
    app.add_plugins(plugin);
    app.finish();
    app.cleanup();
    (app, clock)
}

fn update(identifier: &str, x: f32) -> StateUpdate {
    StateUpdate::new(identity_hash(identifier), Vec3::new(x, 0.0, 0.0), 0.0)
}

#[test]
fn test_plugin_interpolates_every_frame() {
    let (mut app, clock) = app_with_clock(SyncPlugin::default());
    {
        let mut engine = app.world_mut().resource_mut::<SyncEngine>();
        engine.apply_remote_update("alice", &update("alice", 0.0)).unwrap();
        engine.apply_remote_update("alice", &update("alice", 10.0)).unwrap();
    }

    app.update();
    let engine = app.world().resource::<SyncEngine>();
    assert!(engine.is_running());
    assert_eq!(engine.record("alice").unwrap().lod(), LodLevel::Full);

    clock.advance(Duration::from_millis(16));
    app.update();
    let x = app
        .world()
        .resource::<SyncEngine>()
        .record("alice")
        .unwrap()
        .position()
        .x;
    assert_relative_eq!(x, 1.92, epsilon = 1e-4);
}

#[test]
fn test_plugin_flushes_notifications() {
    let (mut app, clock) = app_with_clock(SyncPlugin::default());
    let count = Arc::new(AtomicUsize::new(0));
    let inner = count.clone();
    {
        let mut engine = app.world_mut().resource_mut::<SyncEngine>();
        engine.add_listener(Arc::new(move || {
            inner.fetch_add(1, Ordering::Relaxed);
        }));
        engine.apply_remote_update("alice", &update("alice", 0.0)).unwrap();
    }
    app.update();
    assert_eq!(count.load(Ordering::Relaxed), 0);

    clock.advance(Duration::from_millis(40));
    app.update();
    assert_eq!(count.load(Ordering::Relaxed), 1);
}

#[test]
fn test_plugin_inserts_engine_from_config() {
    let config = SyncConfig::default().with_visible_capacity(5);
    let mut app = App::new();
    app.add_plugins(SyncPlugin {
        config,
        autostart: false,
    });
    app.finish();
    app.cleanup();
    app.update();

    let engine = app.world().resource::<SyncEngine>();
    assert_eq!(engine.config().visible_capacity, 5);
    assert!(!engine.is_running());
}
