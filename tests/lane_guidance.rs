use lane_dynamics::{
    lane_control::{
        LaneControllerInit, LaneInput, LaneTransitionState, TransitionEvent, TransitionKind,
    },
    physics::SteeringAndDriftInputs,
    track::{LaneSpan, StraightRoad},
    DriveStatus, DynamicsTuning, VehicleController, VehicleControllerInit,
};

const DT: f64 = 1.0 / 60.0;

fn vehicle() -> VehicleController {
    VehicleControllerInit::new(DynamicsTuning::default())
        .build()
        .unwrap()
}

fn coast() -> SteeringAndDriftInputs {
    SteeringAndDriftInputs::default()
}

#[test]
fn simple_lane_change() {
    let mut vehicle = vehicle();
    let road = StraightRoad::default();

    let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(0.5, false), &road);
    let duration = match report.transition_event {
        Some(TransitionEvent::Started {
            kind: TransitionKind::LaneChange,
            to_lane: 1,
            duration,
            ..
        }) => duration,
        other => panic!("expected a lane change, got {:?}", other),
    };
    assert!((0.45..=1.0).contains(&duration));

    let mut completed_after = None;
    for tick in 1..120 {
        let (_, report) = vehicle.step(DT, coast(), &road);
        if let Some(TransitionEvent::Completed { lane: 1 }) = report.transition_event {
            completed_after = Some(tick as f64 * DT);
        }
    }

    let elapsed = completed_after.unwrap();
    assert!(elapsed >= 0.45 - 1e-9 && elapsed <= 1.0 + DT);
    assert_eq!(vehicle.committed_lane(), 1);
    assert!((vehicle.state().lateral_offset - 3.6).abs() < 0.05);
}

#[test]
fn lateral_offset_never_jumps() {
    let tuning = DynamicsTuning::default();
    let mut vehicle = vehicle();
    let road = StraightRoad::default();
    let max_step = tuning.max_lateral_speed * DT + 1e-12;

    let mut last = vehicle.state().lateral_offset;
    for tick in 0..240 {
        let steer = match tick {
            0 => 1.0,
            60 => -1.0,
            _ => 0.0,
        };
        let (output, _) = vehicle.step(DT, SteeringAndDriftInputs::new(steer, false), &road);
        assert!((output.state.lateral_offset - last).abs() <= max_step);
        last = output.state.lateral_offset;
    }
}

#[test]
fn offset_converges_monotonically_after_commit() {
    let mut vehicle = vehicle();
    let road = StraightRoad::default();

    vehicle.step(DT, SteeringAndDriftInputs::new(0.5, false), &road);

    let mut last = vehicle.state().lateral_offset;
    let mut committed = false;
    for _ in 0..(60 * 3) {
        let (output, _) = vehicle.step(DT, coast(), &road);
        let offset = output.state.lateral_offset;

        assert!(offset >= last - 1e-12);
        assert!(offset <= 3.6 + 1e-9);
        if !vehicle.transition().is_active() {
            committed = true;
        }
        last = offset;
    }

    assert!(committed);
    assert!((last - 3.6).abs() < 1e-3);
}

#[test]
fn abort_at_half_way_keeps_the_target_and_returns() {
    let mut vehicle = vehicle();
    let road = StraightRoad::default();
    let lane_width = DynamicsTuning::default().lane_width;

    vehicle.step(DT, SteeringAndDriftInputs::new(0.5, false), &road);
    let duration = vehicle.transition().duration;
    let half = (duration / 2.0 / DT).round() as usize;
    for _ in 0..half {
        vehicle.step(DT, coast(), &road);
    }
    assert!((vehicle.transition().progress - duration / 2.0).abs() < 1e-9);
    let before = vehicle.transition().target_center(lane_width);

    let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(-0.9, false), &road);
    assert!(matches!(
        report.transition_event,
        Some(TransitionEvent::Reversed { toward_lane: 0, .. })
    ));
    // Half way is the steepest point of the blend; one tick moves at most
    // 1.5 * width * dt / duration.
    let after = vehicle.transition().target_center(lane_width);
    assert!((after - before).abs() <= 1.5 * lane_width * DT / duration + 1e-9);

    let mut remaining = DT;
    loop {
        let (_, report) = vehicle.step(DT, coast(), &road);
        remaining += DT;
        if let Some(TransitionEvent::Completed { lane }) = report.transition_event {
            assert_eq!(lane, 0);
            break;
        }
        assert!(remaining < 2.0);
    }
    assert!((remaining - duration / 2.0).abs() <= DT + 1e-9);

    for _ in 0..90 {
        vehicle.step(DT, coast(), &road);
    }
    assert!(vehicle.state().lateral_offset.abs() < 0.05);
}

#[test]
fn early_abort_returns_in_the_time_already_spent() {
    let mut vehicle = vehicle();
    let road = StraightRoad::default();
    let lane_width = DynamicsTuning::default().lane_width;

    vehicle.step(DT, SteeringAndDriftInputs::new(0.5, false), &road);
    let duration = vehicle.transition().duration;
    let quarter = (duration / 4.0 / DT).round() as usize;
    for _ in 0..quarter {
        vehicle.step(DT, coast(), &road);
    }
    let spent = vehicle.transition().progress;
    assert!((spent - duration / 4.0).abs() <= DT);
    let before = vehicle.transition().target_center(lane_width);

    let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(-0.9, false), &road);
    assert!(matches!(
        report.transition_event,
        Some(TransitionEvent::Reversed { toward_lane: 0, .. })
    ));
    let after = vehicle.transition().target_center(lane_width);
    assert!((after - before).abs() <= 1.5 * lane_width * DT / duration + 1e-9);

    let mut remaining = DT;
    loop {
        let (_, report) = vehicle.step(DT, coast(), &road);
        remaining += DT;
        if let Some(TransitionEvent::Completed { lane }) = report.transition_event {
            assert_eq!(lane, 0);
            break;
        }
        assert!(remaining < 2.0);
    }
    // Mirrored progress: the way back takes as long as the way out did,
    // not the rest of the original duration.
    assert!((remaining - spent).abs() <= DT + 1e-9);
    assert!(remaining < duration - spent - DT);

    for _ in 0..90 {
        vehicle.step(DT, coast(), &road);
    }
    assert!(vehicle.state().lateral_offset.abs() < 0.05);
    assert_eq!(vehicle.committed_lane(), 0);
}

#[test]
fn reversal_mirrors_progress_exactly() {
    let tuning = DynamicsTuning::default();
    let mut control = LaneControllerInit::from_tuning(&tuning).build();
    let road = StraightRoad::default();
    let mut state = LaneTransitionState::idle(0, tuning.lane_width);

    let input = |steer| LaneInput {
        steer,
        handbrake: false,
        forward_speed: 30.0,
        path_position: 0.0,
    };
    control.step(&mut state, input(1.0), &road, DT);
    state.progress = state.duration / 2.0;
    let before = state.target_center(tuning.lane_width);

    // A vanishing step isolates the reversal from the progress update.
    control.step(&mut state, input(-1.0), &road, 1e-12);
    let after = state.target_center(tuning.lane_width);

    assert_eq!(state.reversals, 1);
    assert!((after - before).abs() < 1e-9);
    assert!((state.duration - state.progress - state.duration / 2.0).abs() < 1e-9);
}

#[test]
fn blocked_lane_is_never_entered() {
    let mut vehicle = vehicle();
    let road = StraightRoad::default().with_obstructed_lane(1);

    for _ in 0..60 {
        let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(1.0, false), &road);
        assert!(report.transition_event.is_none());
    }
    assert_eq!(vehicle.committed_lane(), 0);
}

#[test]
fn fork_commit_zone_locks_lane_changes_and_softens_magnetism() {
    let init = VehicleControllerInit {
        path_position: 80.0,
        ..VehicleControllerInit::new(DynamicsTuning::default())
    };
    let mut vehicle = init.build().unwrap();
    let road = StraightRoad::default().with_fork_at(100.0);

    let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(1.0, false), &road);
    assert!(report.in_commit_zone);
    assert!(report.transition_event.is_none());
    assert!(!vehicle.transition().is_active());

    // 20 m out of an 80 m ramp.
    assert!((report.magnetism_multiplier - 0.746875).abs() < 1e-9);
}

#[test]
fn merge_completes_by_distance() {
    let mut vehicle = vehicle();
    let road = StraightRoad::new(LaneSpan::new(-1, 2));

    vehicle.begin_merge(1, 60.0);
    let start = vehicle.state().path_position;

    let mut completed_at = None;
    for _ in 0..(60 * 4) {
        let (output, report) = vehicle.step(DT, SteeringAndDriftInputs::new(-1.0, false), &road);
        if let Some(TransitionEvent::Completed { lane }) = report.transition_event {
            assert_eq!(lane, 1);
            completed_at = Some(output.state.path_position - start);
            break;
        }
        assert_eq!(report.status, DriveStatus::Merging);
    }

    let travelled = completed_at.unwrap();
    assert!((travelled - 60.0).abs() <= 30.0 * DT + 1e-6);
}

#[test]
fn merge_replaces_a_lane_change_in_flight() {
    let mut vehicle = vehicle();
    let road = StraightRoad::new(LaneSpan::new(-1, 2));
    let lane_width = DynamicsTuning::default().lane_width;

    vehicle.step(DT, SteeringAndDriftInputs::new(1.0, false), &road);
    for _ in 0..10 {
        vehicle.step(DT, coast(), &road);
    }
    let center = vehicle.transition().target_center(lane_width);

    vehicle.begin_merge(-1, 40.0);
    let transition = vehicle.transition();
    assert_eq!(transition.kind(), Some(TransitionKind::Merge));
    assert_eq!(transition.from_center_offset, center);
    assert_eq!(transition.to_center_offset, -lane_width);

    // Counter-steer cannot abort a merge.
    let (_, report) = vehicle.step(DT, SteeringAndDriftInputs::new(1.0, false), &road);
    assert!(!matches!(
        report.transition_event,
        Some(TransitionEvent::Reversed { .. })
    ));
    assert_eq!(vehicle.transition().direction(), -1);
}
