//! Multi-tick movement scenarios.

use tether_movement::{
    CameraBasis, CeilingAt, CharacterBody, KinematicState, MovementConfig, MovementSimulator,
    OpenSky, PlaneBody, TickContext, smoothstep,
};
use tether_protocol::{InputSnapshot, Quat, Vec3};

const DT: f32 = 0.1;

fn sim() -> MovementSimulator {
    MovementSimulator::new(MovementConfig::default())
}

// =========================================================================
// Jumping
// =========================================================================

#[test]
fn test_jump_ends_after_nine_ticks_at_ten_hz() {
    let sim = sim();
    let jump = InputSnapshot::default().with_jump(true);

    let mut state = sim
        .advance(&KinematicState::default(), Some(&jump), &TickContext::grounded(DT))
        .state;
    assert!(state.is_jumping);

    for tick in 2..=9 {
        assert!(state.is_jumping, "still jumping before tick {tick}");
        state = sim.advance(&state, None, &TickContext::airborne(DT)).state;
    }

    assert!(!state.is_jumping);
    assert_eq!(state.jump_elapsed_time, 0.0);
}

#[test]
fn test_jump_lift_never_increases() {
    let sim = sim();
    let gravity_step = sim.config().gravity * DT;
    let jump = InputSnapshot::default().with_jump(true);

    let mut step = sim.advance(&KinematicState::default(), Some(&jump), &TickContext::grounded(DT));
    let mut lifts = vec![step.displacement.y + gravity_step];
    while step.state.is_jumping {
        step = sim.advance(&step.state, None, &TickContext::airborne(DT));
        lifts.push(step.displacement.y + gravity_step);
    }

    assert_eq!(lifts.len(), 9);
    assert!((lifts[0] - 18.0 * DT).abs() < 1e-5);
    for pair in lifts.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-6, "lift rose: {pair:?}");
    }
}

#[test]
fn test_smoothstep_is_monotonic_over_jump_curve() {
    let mut previous = f32::INFINITY;
    for i in 0..=100 {
        let value = smoothstep(18.0, 18.0 * 0.3, i as f32 / 100.0);
        assert!(value <= previous);
        previous = value;
    }
}

#[test]
fn test_grounded_jump_hold_does_not_restart_midair() {
    let sim = sim();
    let jump = InputSnapshot::default().with_jump(true);
    let first = sim.advance(&KinematicState::default(), Some(&jump), &TickContext::grounded(DT));
    let second = sim.advance(&first.state, Some(&jump), &TickContext::airborne(DT));
    assert!((second.state.jump_elapsed_time - 2.0 * DT).abs() < 1e-6);
}

// =========================================================================
// Crouching
// =========================================================================

#[test]
fn test_crouch_held_for_many_ticks_toggles_once() {
    let sim = sim();
    let crouch = InputSnapshot::default().with_crouch_edge(true);
    let mut state = KinematicState::default();

    for _ in 0..5 {
        state = sim.advance(&state, Some(&crouch), &TickContext::grounded(DT)).state;
    }
    assert!(state.is_crouching);

    state = sim
        .advance(&state, Some(&InputSnapshot::default()), &TickContext::grounded(DT))
        .state;
    state = sim.advance(&state, Some(&crouch), &TickContext::grounded(DT)).state;
    assert!(!state.is_crouching);
}

#[test]
fn test_crouch_edge_ignored_on_ticks_without_input() {
    let sim = sim();
    let crouch = InputSnapshot::default().with_crouch_edge(true);
    let mut state = sim
        .advance(&KinematicState::default(), Some(&crouch), &TickContext::grounded(DT))
        .state;
    for _ in 0..3 {
        state = sim.advance(&state, None, &TickContext::grounded(DT)).state;
    }
    assert!(state.is_crouching);
}

// =========================================================================
// Driving a body
// =========================================================================

#[test]
fn test_step_moves_body_and_lands() {
    let sim = sim();
    let mut body = PlaneBody::new(Vec3::ZERO);
    let jump = InputSnapshot::new(0.0, 1.0).with_jump(true);

    let mut step = sim.step(&KinematicState::default(), Some(&jump), &mut body, &OpenSky, CameraBasis::WORLD, DT);
    assert!(!body.is_grounded());
    assert!(body.position().y > 0.0);

    for _ in 0..60 {
        step = sim.step(&step.state, None, &mut body, &OpenSky, CameraBasis::WORLD, DT);
    }
    assert!(body.is_grounded());
    assert_eq!(body.position().y, 0.0);
    assert!(body.position().z > 25.0);
}

#[test]
fn test_step_low_ceiling_cancels_jump_next_tick() {
    let sim = sim();
    let mut body = PlaneBody::new(Vec3::ZERO);
    // Capsule centre at 1.0, probe reaches 1.1 above it.
    let ceiling = CeilingAt(2.5);
    let jump = InputSnapshot::default().with_jump(true);

    let first = sim.step(&KinematicState::default(), Some(&jump), &mut body, &ceiling, CameraBasis::WORLD, DT);
    assert!(first.state.is_jumping);

    let second = sim.step(&first.state, None, &mut body, &ceiling, CameraBasis::WORLD, DT);
    assert!(!second.state.is_jumping);
    assert_eq!(second.state.jump_elapsed_time, 0.0);
}

#[test]
fn test_two_simulators_agree_on_same_input() {
    let sim = sim();
    let inputs = [
        InputSnapshot::new(1.0, 1.0).with_sprint(true),
        InputSnapshot::new(0.5, -1.0).with_jump(true),
        InputSnapshot::new(-1.0, 0.0).with_crouch_edge(true),
    ];
    let mut a = PlaneBody::new(Vec3::ZERO);
    let mut b = PlaneBody::new(Vec3::ZERO);
    let (mut sa, mut sb) = (KinematicState::default(), KinematicState::default());

    for input in inputs.iter().cycle().take(30) {
        sa = sim.step(&sa, Some(input), &mut a, &OpenSky, CameraBasis::WORLD, DT).state;
        sb = sim.step(&sb, Some(input), &mut b, &OpenSky, CameraBasis::WORLD, DT).state;
    }
    assert_eq!(sa, sb);
    assert_eq!(a.transform(), b.transform());
}

// =========================================================================
// Input bounds
// =========================================================================

#[test]
fn test_advance_oversized_axes_move_at_full_speed_only() {
    let sim = sim();
    let oversized = InputSnapshot {
        horizontal: 5.0,
        vertical: -40.0,
        ..InputSnapshot::default()
    };
    let full = InputSnapshot::new(1.0, -1.0);

    let step = sim.advance(&KinematicState::default(), Some(&oversized), &TickContext::grounded(DT));
    let expected = sim.advance(&KinematicState::default(), Some(&full), &TickContext::grounded(DT));

    assert!((step.displacement.x - 0.5).abs() < 1e-6);
    assert!((step.displacement.z + 0.5).abs() < 1e-6);
    assert_eq!(step.displacement, expected.displacement);
    assert_eq!(step.state.horizontal_input, 1.0);
    assert_eq!(step.state.vertical_input, -1.0);
}

#[test]
fn test_advance_nan_axis_stays_put() {
    let sim = sim();
    let broken = InputSnapshot {
        horizontal: f32::NAN,
        ..InputSnapshot::default()
    };
    let step = sim.advance(&KinematicState::default(), Some(&broken), &TickContext::grounded(DT));
    assert_eq!(step.displacement.x, 0.0);
    assert_eq!(step.displacement.z, 0.0);
    assert_eq!(step.rotation, Quat::IDENTITY);
}
