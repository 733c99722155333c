//! Participants joining, leaving and going quiet
use crate::stepper::SyncStepper;
use bevy_math::Vec3;
use core::time::Duration;
use crowdsync::prelude::*;
use bevy_platform::sync::atomic::Ordering;
use test_log::test;

/// 80 participants at distances 1..=80 along x, joined in scrambled order
fn crowd(stepper: &mut SyncStepper) {
    for i in 0..80 {
        let distance = ((i * 37) % 80 + 1) as f32;
        stepper
            .update_remote(&format!("user-{i}"), Vec3::new(distance, 0.0, 0.0))
            .unwrap();
    }
}

#[test]
fn test_crowd_is_classified_and_capped() {
    let mut stepper = SyncStepper::started();
    crowd(&mut stepper);

    let report = stepper.frame_step();
    assert_eq!(report.tier_counts, [30, 30, 20, 0]);
    assert_eq!(report.visible, 50);

    let distances: Vec<f32> = stepper
        .engine
        .visible_records()
        .map(EntityRecord::distance)
        .collect();
    assert_eq!(distances.len(), 50);
    assert_eq!(distances[0], 1.0);
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));

    let stats = stepper.engine.stats();
    assert_eq!(stats.active, 80);
    assert_eq!(stats.visible, 50);
    assert_eq!(stats.mean_visible_distance, 25.5);
}

#[test]
fn test_joins_and_leaves_notify_listeners() {
    let mut stepper = SyncStepper::started();
    let notified = stepper.counting_listener();
    crowd(&mut stepper);

    // the whole burst of joins produces a single notification
    stepper.frame_step();
    assert_eq!(notified.load(Ordering::Relaxed), 0);
    stepper.frame_step_n(2);
    assert_eq!(notified.load(Ordering::Relaxed), 1);
    stepper.frame_step_n(10);
    assert_eq!(notified.load(Ordering::Relaxed), 1);

    // user-0 sits at distance 1: the closest one
    assert!(stepper.engine.release("user-0"));
    stepper.frame_step_n(3);
    assert_eq!(notified.load(Ordering::Relaxed), 2);
    assert_eq!(stepper.engine.active_count(), 79);
    let closest = stepper.engine.visible_records().next().unwrap();
    assert_eq!(closest.distance(), 2.0);
}

#[test]
fn test_periodic_sweep_releases_quiet_participants() {
    let mut stepper = SyncStepper::started();
    let notified = stepper.counting_listener();
    stepper.update_remote("quiet", Vec3::new(5.0, 0.0, 0.0)).unwrap();
    stepper.update_remote("chatty", Vec3::new(6.0, 0.0, 0.0)).unwrap();
    // the first frame arms the sweep timer
    stepper.frame_step();

    let mut swept = 0;
    for _ in 0..12 {
        stepper.advance(Duration::from_secs(1));
        stepper
            .update_remote("chatty", Vec3::new(6.0, 0.0, 0.0))
            .unwrap();
        swept += stepper.frame_step().swept;
    }
    assert_eq!(swept, 1);
    assert!(stepper.engine.record("quiet").is_none());
    assert!(stepper.engine.record("chatty").is_some());
    // one for the joins, one for the sweep
    assert_eq!(notified.load(Ordering::Relaxed), 2);
}

#[test]
fn test_full_pool_drops_newcomers_until_someone_leaves() {
    let config = SyncConfig::default().with_pool(PoolConfig::default().with_capacity(3));
    let mut stepper = SyncStepper::new(config, Duration::from_millis(16));
    for id in ["a", "b", "c"] {
        stepper.update_remote(id, Vec3::ZERO).unwrap();
    }
    assert_eq!(
        stepper.update_remote("d", Vec3::ZERO),
        Err(SyncError::Pool(PoolError::Exhausted { capacity: 3 }))
    );
    // the engine keeps running normally
    assert_eq!(stepper.frame_step().visible, 3);

    stepper.engine.release("b");
    assert!(stepper.update_remote("d", Vec3::ZERO).unwrap().is_new());
    assert_eq!(stepper.engine.pool().utilization(), 1.0);
}

#[test]
fn test_profile_before_first_state_is_not_rendered() {
    let config = SyncConfig::default().with_pool(PoolConfig::default().with_capacity(1));
    let mut stepper = SyncStepper::new(config, Duration::from_millis(16));
    stepper.engine.start();
    stepper.update_remote("a", Vec3::new(40.0, 0.0, 0.0)).unwrap();
    stepper.frame_step();
    assert!(stepper.engine.release("a"));

    let profile = EntityProfile {
        display_name: "Bea".to_string(),
        ..Default::default()
    };
    stepper.engine.apply_profile("b", &profile).unwrap();
    let report = stepper.frame_step();
    assert_eq!(report.visible, 0);
    assert_eq!(report.tier_counts, [0, 0, 0, 1]);
    assert_eq!(stepper.engine.visible_records().count(), 0);

    stepper.update_remote("b", Vec3::new(5.0, 0.0, 0.0)).unwrap();
    let report = stepper.frame_step();
    assert_eq!(report.visible, 1);
    assert_eq!(stepper.position("b"), Some(Vec3::new(5.0, 0.0, 0.0)));
}
