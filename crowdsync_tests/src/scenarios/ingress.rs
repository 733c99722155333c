//! Remote state arriving over the wire
use crate::stepper::SyncStepper;
use approx::assert_relative_eq;
use bevy_math::Vec3;
use core::time::Duration;
use crowdsync::prelude::*;
use test_log::test;

#[test]
fn test_wire_batch_drives_interpolation() {
    let mut stepper = SyncStepper::started();
    stepper.update_remote("alice", Vec3::ZERO).unwrap();
    stepper.update_remote("bob", Vec3::new(40.0, 0.0, 0.0)).unwrap();
    stepper.frame_step();

    let report = stepper
        .send_batch(&[
            ("alice", Vec3::new(5.0, 1.25, 0.0)),
            ("bob", Vec3::new(45.0, 0.0, 0.0)),
            ("carol", Vec3::ONE),
        ])
        .unwrap();
    assert_eq!(
        report,
        IngressReport {
            applied: 2,
            unknown: 1
        }
    );
    // wire records never introduce participants
    assert!(stepper.engine.record("carol").is_none());
    // the live state is untouched until the next frame
    assert_eq!(stepper.position("alice"), Some(Vec3::ZERO));

    stepper.frame_step_n(120);
    let alice = stepper.position("alice").unwrap();
    assert_relative_eq!(alice.x, 5.0, epsilon = 1e-3);
    assert_relative_eq!(alice.y, 1.25, epsilon = 1e-3);
    assert_relative_eq!(stepper.position("bob").unwrap().x, 45.0, epsilon = 1e-3);
}

#[test]
fn test_closer_participants_converge_faster() {
    let mut stepper = SyncStepper::started();
    stepper.update_remote("near", Vec3::new(0.0, 0.0, 10.0)).unwrap();
    stepper.update_remote("far", Vec3::new(0.0, 0.0, 80.0)).unwrap();
    stepper.frame_step();
    stepper
        .send_batch(&[
            ("near", Vec3::new(5.0, 0.0, 10.0)),
            ("far", Vec3::new(5.0, 0.0, 80.0)),
        ])
        .unwrap();

    stepper.frame_step_n(5);
    let near = stepper.position("near").unwrap().x;
    let far = stepper.position("far").unwrap().x;
    assert!(near > far, "near={near} far={far}");
}

#[test]
fn test_moving_participant_is_extrapolated() {
    let mut stepper = SyncStepper::started();
    stepper.update_remote("runner", Vec3::ZERO).unwrap();
    stepper.frame_step();

    // 1 unit in 100ms according to the sender
    let update = SyncStepper::state("runner", Vec3::new(1.0, 0.0, 0.0))
        .with_flags(StateFlags::MOVING)
        .with_timestamp_delta(Duration::from_millis(100));
    stepper.send_updates(&[update]).unwrap();
    assert_relative_eq!(
        stepper.engine.record("runner").unwrap().velocity().x,
        10.0,
        epsilon = 1e-3
    );

    stepper.frame_step();
    // approach 12 * 0.016 of the gap, plus 10 * 0.016 * 0.3 of extrapolation
    assert_relative_eq!(stepper.position("runner").unwrap().x, 0.24, epsilon = 1e-4);
}

#[test]
fn test_malformed_batch_is_rejected_whole() {
    let mut stepper = SyncStepper::started();
    stepper.update_remote("alice", Vec3::ZERO).unwrap();

    let bytes = encode_batch(&[
        SyncStepper::state("alice", Vec3::new(3.0, 0.0, 0.0)),
        SyncStepper::state("alice", Vec3::new(4.0, 0.0, 0.0)),
    ])
    .unwrap();
    let result = stepper.engine.apply_batch(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(SyncError::Decode(_))));
    assert_eq!(
        stepper.engine.record("alice").unwrap().target_position(),
        Vec3::ZERO
    );

    // the engine keeps accepting well-formed batches afterwards
    let report = stepper.engine.apply_batch(&bytes).unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(
        stepper.engine.record("alice").unwrap().target_position(),
        Vec3::new(4.0, 0.0, 0.0)
    );
}
