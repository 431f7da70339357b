use super::doctrine::{NavDoctrine, ReturnStep};
use super::flight_computer::FlightComputer;
use super::flight_dynamics::FlightDynamics;
use super::flight_state::{FlightMode, NavStatus};
use super::supervisor::{CommandAck, Supervisor, VehicleCommand};
use super::vehicle_id::VehicleId;
use super::vehicle_state::{ControlInputs, ORIGIN, VehicleState};
use crate::util::{SchedulerConfig, Vec3D};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const DT: f64 = 1.0 / 60.0;

fn armed_vehicle() -> FlightComputer {
    let mut f_cont = FlightComputer::new(VehicleId::from("test-vehicle"));
    f_cont.arm();
    f_cont
}

fn run(f_cont: &mut FlightComputer, ticks: usize) {
    for _ in 0..ticks {
        f_cont.advance(DT);
    }
}

fn drive(forward: f64, yaw: f64, throttle: f64) -> ControlInputs {
    ControlInputs::new(forward, yaw, throttle, 0.0, 0.0, 0.0)
}

fn place(f_cont: &mut FlightComputer, pos: Vec3D<f64>) { f_cont.state_mut().kinematics.position = pos; }

#[test]
fn test_full_forward_reaches_max_speed() {
    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(1.0, 0.0, 0.0));
    run(&mut f_cont, 60);
    let kin = f_cont.state().kinematics();
    assert_eq!(kin.speed, FlightDynamics::MAX_SPEED);
    assert!(kin.position.z() > 4.0, "vehicle should have moved north, is at {}", kin.position);
    assert!(kin.position.x().abs() < 1e-9);
    assert!((kin.velocity.z() - 8.0).abs() < 1e-9);
}

#[test]
fn test_speed_bounded_under_random_inputs() {
    let mut rng = rand::rng();
    let mut f_cont = armed_vehicle();
    for i in 0..5000 {
        if i % 20 == 0 {
            let controls = drive(
                rng.random_range(-1.5..=1.5),
                rng.random_range(-1.0..=1.0),
                rng.random_range(0.0..=1.0),
            );
            f_cont.set_controls(controls);
        }
        f_cont.advance(DT);
        let speed = f_cont.state().kinematics().speed;
        assert!(
            (-FlightDynamics::MAX_REVERSE_SPEED..=FlightDynamics::MAX_SPEED).contains(&speed),
            "speed {speed} out of bounds at tick {i}"
        );
        let alt = f_cont.state().position().y();
        assert!((0.0..=100.0).contains(&alt));
    }
}

#[test]
fn test_yaw_rate_and_speed_snap_to_zero() {
    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(1.0, 1.0, 0.0));
    run(&mut f_cont, 30);
    assert!(f_cont.state().kinematics().yaw_rate > 0.0);
    f_cont.set_controls(ControlInputs::default());
    run(&mut f_cont, 200);
    assert_eq!(f_cont.state().kinematics().yaw_rate, 0.0);
    assert_eq!(f_cont.state().kinematics().speed, 0.0);
}

#[test]
fn test_throttle_altitude_limits() {
    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(0.0, 0.0, 1.0));
    run(&mut f_cont, 60 * 50);
    assert_eq!(f_cont.state().position().y(), 100.0);

    f_cont.set_controls(drive(0.0, 0.0, 0.05));
    run(&mut f_cont, 60);
    assert_eq!(f_cont.state().position().y(), 100.0, "throttle inside dead band holds altitude");

    f_cont.set_controls(drive(0.0, 0.0, 0.2));
    run(&mut f_cont, 60 * 80);
    assert_eq!(f_cont.state().position().y(), 0.0);
}

#[test]
fn test_confidence_settles_to_jam_target() {
    assert_eq!(NavDoctrine::target_confidence(80.0), 10.0);
    assert_eq!(NavDoctrine::target_confidence(100.0), 0.0);
    assert_eq!(NavDoctrine::target_confidence(0.0), 100.0);

    for jam in [0.0, 20.0, 50.0, 80.0] {
        let mut f_cont = armed_vehicle();
        f_cont.adjust_jam(jam);
        run(&mut f_cont, 60 * 20);
        let conf = f_cont.state().nav_confidence();
        let expected = (100.0 - jam * 1.125_f64).clamp(0.0, 100.0);
        assert!((conf - expected).abs() < 1e-6, "jam {jam}: confidence {conf}, expected {expected}");
        assert!(!f_cont.state().retrograde_active(), "jam {jam} must not trigger a return");
    }
}

#[test]
fn test_confidence_recovers_when_jam_lifts() {
    let mut f_cont = armed_vehicle();
    f_cont.adjust_jam(60.0);
    run(&mut f_cont, 60 * 10);
    assert!(f_cont.state().nav_confidence() < 40.0);
    assert_eq!(f_cont.state().status(), NavStatus::SafetyOverride);
    f_cont.adjust_jam(-60.0);
    run(&mut f_cont, 60 * 10);
    assert!(f_cont.state().nav_confidence() > 99.0);
    assert_eq!(f_cont.state().status(), NavStatus::Nominal);
}

#[test]
fn test_heavy_jam_triggers_return_and_freezes_confidence() {
    let mut f_cont = armed_vehicle();
    place(&mut f_cont, Vec3D::new(40.0, 2.0, 0.0));
    f_cont.adjust_jam(100.0);

    let mut ticks = 0;
    while !f_cont.state().retrograde_active() {
        f_cont.advance(DT);
        ticks += 1;
        assert!(ticks < 600, "return never triggered");
    }
    let frozen = f_cont.state().nav_confidence();
    assert!(frozen < NavDoctrine::THRESH_ABORT);
    assert_eq!(f_cont.state().mode(), FlightMode::Retrograde);
    assert_eq!(f_cont.state().status(), NavStatus::SafetyOverride);

    run(&mut f_cont, 60);
    assert!(f_cont.state().retrograde_active());
    assert_eq!(f_cont.state().nav_confidence(), frozen);
}

#[test]
fn test_low_battery_triggers_return_next_tick() {
    let mut f_cont = armed_vehicle();
    place(&mut f_cont, Vec3D::new(0.0, 2.0, 30.0));
    f_cont.state_mut().battery = 14.0;
    assert!(NavDoctrine::should_abort(f_cont.state()));
    f_cont.advance(DT);
    assert!(f_cont.state().retrograde_active());
    assert_eq!(f_cont.state().mode(), FlightMode::Retrograde);
    assert_eq!(f_cont.state().nav_confidence(), 100.0);
}

#[test]
fn test_trigger_never_fires_while_returning() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    state.nav_confidence = 5.0;
    state.battery = 5.0;
    assert!(NavDoctrine::should_abort(&state));
    doctrine.start_retrograde(&mut state, false);
    assert!(!NavDoctrine::should_abort(&state));

    state.nav_confidence = 50.0;
    state.battery = 50.0;
    state.retrograde_active = false;
    assert!(!NavDoctrine::should_abort(&state));
    state.battery = 14.9;
    assert!(NavDoctrine::should_abort(&state));
}

#[test]
fn test_return_queue_is_reverse_chronological() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    let anchors = [Vec3D::new(10.0, 2.0, 0.0), Vec3D::new(20.0, 2.0, 5.0), Vec3D::new(30.0, 2.0, -5.0)];
    for pos in anchors {
        state.kinematics.position = pos;
        assert_eq!(doctrine.log_anchor(&state), Some(pos));
    }
    doctrine.start_retrograde(&mut state, false);

    assert_eq!(doctrine.target_point(), Some(anchors[2]));
    let remaining: Vec<_> = doctrine.return_queue().iter().copied().collect();
    assert_eq!(remaining, vec![anchors[1], anchors[0], ORIGIN]);
    assert!(state.retrograde_active);
    assert_eq!(state.mode, FlightMode::Retrograde);
    assert_eq!(doctrine.anchors(), &anchors[..]);
}

#[test]
fn test_commander_override_without_anchors_targets_origin() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    state.kinematics.position = Vec3D::new(25.0, 2.0, 25.0);
    doctrine.start_retrograde(&mut state, true);
    assert_eq!(doctrine.target_point(), Some(ORIGIN));
    assert!(doctrine.return_queue().is_empty());
    assert_eq!(state.mode, FlightMode::CommanderRtb);
    assert_eq!(state.status(), NavStatus::CommanderRtb);
}

#[test]
fn test_waypoint_arrival_advances_queue() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    let first = Vec3D::new(10.0, 2.0, 0.0);
    let second = Vec3D::new(20.0, 2.0, 0.0);
    for pos in [first, second] {
        state.kinematics.position = pos;
        doctrine.log_anchor(&state);
    }
    doctrine.start_retrograde(&mut state, false);
    state.kinematics.position = second + Vec3D::new(0.5, 7.0, 0.5);

    assert_eq!(doctrine.advance_retrograde(&mut state, DT), ReturnStep::WaypointReached(first));
    assert_eq!(doctrine.target_point(), Some(first));
    assert_eq!(doctrine.return_queue().len(), 1);
    assert!(state.retrograde_active);
}

#[test]
fn test_final_arrival_lands_and_disarms() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    state.armed = true;
    state.nav_confidence = 3.0;
    state.kinematics.position = Vec3D::new(0.6, 5.0, 0.3);
    state.kinematics.velocity = Vec3D::new(1.0, 0.0, 1.0);
    state.kinematics.speed = 6.0;
    doctrine.start_retrograde(&mut state, false);

    assert_eq!(doctrine.advance_retrograde(&mut state, DT), ReturnStep::Landed);
    assert_eq!(state.nav_confidence, 50.0);
    assert!(!state.armed);
    assert!(!state.retrograde_active);
    assert_eq!(state.mode, FlightMode::Landed);
    assert_eq!(state.kinematics.position, ORIGIN);
    assert_eq!(state.kinematics.velocity, Vec3D::zero());
    assert_eq!(state.kinematics.speed, 0.0);
    assert_eq!(doctrine.target_point(), None);
    assert_eq!(state.status(), NavStatus::Warning);
}

#[test]
fn test_return_without_target_falls_back_to_stabilize() {
    let mut state = VehicleState::default();
    let mut doctrine = NavDoctrine::default();
    state.retrograde_active = true;
    state.mode = FlightMode::Retrograde;
    assert_eq!(doctrine.advance_retrograde(&mut state, DT), ReturnStep::Aborted);
    assert!(!state.retrograde_active);
    assert_eq!(state.mode, FlightMode::Stabilize);
}

#[test]
fn test_log_anchor_respects_reject_threshold() {
    let mut f_cont = armed_vehicle();
    f_cont.state_mut().nav_confidence = 39.0;
    assert_eq!(f_cont.log_anchor(), None);
    assert!(f_cont.doctrine().anchors().is_empty());

    f_cont.state_mut().nav_confidence = 40.0;
    assert_eq!(f_cont.log_anchor(), Some(ORIGIN));
    assert_eq!(f_cont.doctrine().anchors(), &[ORIGIN]);
}

#[test]
fn test_commander_return_retraces_all_anchors() {
    let mut f_cont = armed_vehicle();
    let anchors = [Vec3D::new(15.0, 2.0, 10.0), Vec3D::new(30.0, 2.0, 25.0), Vec3D::new(10.0, 2.0, 40.0)];
    for pos in anchors {
        place(&mut f_cont, pos);
        assert!(f_cont.log_anchor().is_some());
    }
    place(&mut f_cont, Vec3D::new(-20.0, 2.0, 50.0));
    f_cont.force_return();
    assert_eq!(f_cont.state().status(), NavStatus::CommanderRtb);

    let mut visited = vec![];
    let mut ticks = 0;
    while f_cont.state().mode() != FlightMode::Landed {
        if let Some(target) = f_cont.doctrine().target_point() {
            if visited.last() != Some(&target) {
                visited.push(target);
            }
        }
        f_cont.advance(DT);
        ticks += 1;
        assert!(ticks < 60 * 120, "vehicle did not arrive, at {}", f_cont.state().position());
    }

    assert_eq!(visited, vec![anchors[2], anchors[1], anchors[0], ORIGIN]);
    assert!(!f_cont.state().is_armed());
    assert_eq!(f_cont.state().position(), ORIGIN);
    assert_eq!(f_cont.state().nav_confidence(), 50.0);
    assert!(f_cont.state().battery() < 100.0);
}

#[test]
fn test_empty_battery_disarms_in_return() {
    let mut f_cont = armed_vehicle();
    place(&mut f_cont, Vec3D::new(50.0, 2.0, 0.0));
    f_cont.state_mut().battery = 0.005;
    f_cont.advance(DT);
    assert_eq!(f_cont.state().battery(), 0.0);
    assert!(!f_cont.state().is_armed());
    assert!(f_cont.state().retrograde_active());

    let pos = f_cont.state().position();
    run(&mut f_cont, 30);
    assert_eq!(f_cont.state().position(), pos, "disarmed vehicles are frozen");
}

#[test]
fn test_arm_recharges_and_clears_trail() {
    let mut f_cont = armed_vehicle();
    run(&mut f_cont, 120);
    assert!(!f_cont.doctrine().breadcrumbs().is_empty());

    f_cont.disarm();
    f_cont.state_mut().battery = 10.0;
    f_cont.arm();
    assert_eq!(f_cont.state().battery(), 100.0);
    assert!(f_cont.doctrine().breadcrumbs().is_empty());

    f_cont.state_mut().battery = 10.5;
    f_cont.arm();
    assert_eq!(f_cont.state().battery(), 10.5);
}

#[test]
fn test_breadcrumbs_are_capped() {
    let mut f_cont = armed_vehicle();
    run(&mut f_cont, 13);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 1);
    run(&mut f_cont, 60 * 200);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 500);
}

#[test]
fn test_breadcrumb_every_twelve_ticks() {
    let mut f_cont = armed_vehicle();
    run(&mut f_cont, 11);
    assert!(f_cont.doctrine().breadcrumbs().is_empty());
    run(&mut f_cont, 1);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 1);
    run(&mut f_cont, 11);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 1);
    run(&mut f_cont, 1);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 2);

    run(&mut f_cont, 600 - 24);
    assert_eq!(f_cont.doctrine().breadcrumbs().len(), 50);
}

#[test]
fn test_battery_drains_while_moving() {
    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(1.0, 0.0, 0.0));
    run(&mut f_cont, 45);
    assert_eq!(f_cont.state().kinematics().speed, FlightDynamics::MAX_SPEED);
    let before = f_cont.state().battery();
    run(&mut f_cont, 60);
    assert!((before - f_cont.state().battery() - 0.5).abs() < 1e-9, "battery {}", f_cont.state().battery());

    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(-1.0, 0.0, 0.0));
    run(&mut f_cont, 30);
    assert_eq!(f_cont.state().kinematics().speed, -FlightDynamics::MAX_REVERSE_SPEED);
    let before = f_cont.state().battery();
    run(&mut f_cont, 60);
    assert!((before - f_cont.state().battery() - 0.5).abs() < 1e-9, "battery {}", f_cont.state().battery());
}

#[test]
fn test_battery_holds_when_slow_or_stationary() {
    let mut f_cont = armed_vehicle();
    run(&mut f_cont, 60);
    assert_eq!(f_cont.state().battery(), 100.0);

    f_cont.state_mut().kinematics.speed = 0.08;
    run(&mut f_cont, 60);
    assert_eq!(f_cont.state().battery(), 100.0);
    assert_eq!(f_cont.state().kinematics().speed, 0.0);

    let mut state = VehicleState { armed: true, ..VehicleState::default() };
    state.kinematics.speed = 0.1;
    assert!(!NavDoctrine::drain_battery(&mut state, 1.0));
    assert_eq!(state.battery(), 100.0);
    state.kinematics.speed = -4.0;
    assert!(!NavDoctrine::drain_battery(&mut state, 1.0));
    assert_eq!(state.battery(), 99.5);
}

#[test]
fn test_disarmed_vehicle_is_frozen() {
    let mut f_cont = FlightComputer::new(VehicleId::from("idle"));
    f_cont.adjust_jam(100.0);
    f_cont.set_controls(drive(1.0, 1.0, 1.0));
    run(&mut f_cont, 120);
    assert_eq!(f_cont.state().nav_confidence(), 100.0);
    assert_eq!(f_cont.state().position(), ORIGIN);
    assert_eq!(f_cont.sim_time(), 0.0);
}

#[test]
fn test_reset_restores_defaults() {
    let mut f_cont = armed_vehicle();
    f_cont.set_controls(drive(1.0, 0.5, 0.0));
    f_cont.adjust_jam(30.0);
    run(&mut f_cont, 120);
    f_cont.log_anchor();
    f_cont.force_return();
    f_cont.reset();

    assert_eq!(f_cont.state(), &VehicleState::default());
    assert_eq!(f_cont.doctrine(), &NavDoctrine::default());
    assert_eq!(f_cont.snapshot(0).controls, ControlInputs::default());
}

#[test]
fn test_adjust_jam_clamps() {
    let mut f_cont = FlightComputer::new(VehicleId::from("jam"));
    assert_eq!(f_cont.adjust_jam(150.0), 100.0);
    assert_eq!(f_cont.adjust_jam(-30.0), 70.0);
    assert_eq!(f_cont.adjust_jam(-300.0), 0.0);
    assert_eq!(f_cont.adjust_jam(f64::NAN), 0.0);
}

#[test]
fn test_controls_are_clamped() {
    let controls = ControlInputs::new(2.0, -3.0, 0.5, 1.5, f64::NAN, -0.25);
    assert_eq!(controls.forward(), 1.0);
    assert_eq!(controls.yaw(), -1.0);
    assert_eq!(controls.throttle(), 0.5);
    assert_eq!(controls.pitch(), 1.0);
    assert_eq!(controls.roll(), 0.0);
    assert_eq!(controls.yaw_rate(), -0.25);
}

#[test]
fn test_status_derivation() {
    use FlightMode::{CommanderRtb, Landed, Retrograde, Stabilize};
    assert_eq!(NavStatus::derive(Stabilize, false, 100.0), NavStatus::Nominal);
    assert_eq!(NavStatus::derive(Stabilize, false, 70.0), NavStatus::Warning);
    assert_eq!(NavStatus::derive(Stabilize, false, 40.1), NavStatus::Warning);
    assert_eq!(NavStatus::derive(Stabilize, false, 40.0), NavStatus::SafetyOverride);
    assert_eq!(NavStatus::derive(Retrograde, true, 100.0), NavStatus::SafetyOverride);
    assert_eq!(NavStatus::derive(CommanderRtb, true, 100.0), NavStatus::CommanderRtb);
    assert_eq!(NavStatus::derive(Landed, false, 50.0), NavStatus::Warning);
    assert_eq!(NavStatus::CommanderRtb.to_string(), "COMMANDER_RTB");
    assert_eq!(NavStatus::SafetyOverride.to_string(), "SAFETY_OVERRIDE");
    assert_eq!(FlightMode::Stabilize.to_string(), "STABILIZE");
}

#[tokio::test]
async fn test_unknown_vehicle_commands_are_noops() {
    let sv = Supervisor::new(SchedulerConfig::default());
    let ghost = VehicleId::from("ghost");
    for cmd in [
        VehicleCommand::Arm,
        VehicleCommand::Disarm,
        VehicleCommand::Reset,
        VehicleCommand::SetControls(drive(1.0, 0.0, 0.0)),
        VehicleCommand::LogAnchor,
        VehicleCommand::ForceReturn,
        VehicleCommand::AdjustJam(10.0),
    ] {
        assert_eq!(sv.dispatch(&ghost, cmd).await, None);
    }
    assert!(!sv.deregister(&ghost).await);

    let id = VehicleId::random();
    let snapshot = sv.register(id.clone()).await;
    assert_eq!(snapshot.status, NavStatus::Nominal);
    assert_eq!(snapshot.kinematics.position, ORIGIN);
    assert_eq!(sv.dispatch(&id, VehicleCommand::Arm).await, Some(CommandAck::Armed));
    assert_eq!(sv.dispatch(&id, VehicleCommand::AdjustJam(-5.0)).await, Some(CommandAck::JamChanged(0.0)));
    assert_eq!(sv.dispatch(&id, VehicleCommand::LogAnchor).await, Some(CommandAck::AnchorLogged(Some(ORIGIN))));
}

#[tokio::test]
async fn test_frames_published_every_second_step() {
    let sv = Supervisor::new(SchedulerConfig::default());
    let mut rx = sv.subscribe();
    sv.register(VehicleId::from("a")).await;
    sv.register(VehicleId::from("b")).await;

    assert!(sv.step().await.is_none());
    let frame = sv.step().await.expect("second step publishes");
    assert_eq!(frame.tick, 2);
    assert_eq!(frame.vehicles.len(), 2);
    assert!(sv.step().await.is_none());

    let received = rx.try_recv().expect("frame was broadcast");
    assert_eq!(received.tick, 2);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_snapshot_truncates_breadcrumbs() {
    let sv = Supervisor::new(SchedulerConfig::default());
    let id = VehicleId::from("trail");
    sv.register(id.clone()).await;
    sv.dispatch(&id, VehicleCommand::Arm).await;
    sv.dispatch(&id, VehicleCommand::SetControls(drive(0.5, 0.2, 0.0))).await;
    for _ in 0..60 * 20 {
        sv.step().await;
    }
    let full_len = sv.with_vehicle(&id, |f| f.doctrine().breadcrumbs().len()).await.unwrap();
    let newest = sv.with_vehicle(&id, |f| f.doctrine().breadcrumbs().latest(1).next().copied()).await.unwrap();
    assert!(full_len > 50);

    let snapshot = sv.list_vehicles().await.remove(0);
    assert_eq!(snapshot.breadcrumbs.len(), 50);
    assert_eq!(snapshot.breadcrumbs.last().copied(), newest);
    assert_eq!(snapshot.return_queue_len, 0);
    assert_eq!(snapshot.controls, drive(0.5, 0.2, 0.0));
}

#[tokio::test]
async fn test_register_deregister_and_listing() {
    let sv = Supervisor::new(SchedulerConfig::default());
    for name in ["charlie", "alpha", "bravo"] {
        sv.register(VehicleId::from(name)).await;
    }
    let names: Vec<_> = sv.list_vehicles().await.into_iter().map(|s| s.vehicle_id.to_string()).collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);

    assert!(sv.deregister(&VehicleId::from("alpha")).await);
    assert!(!sv.deregister(&VehicleId::from("alpha")).await);
    let health = sv.health().await;
    assert!(health.healthy);
    assert!(!health.running);
    assert_eq!(health.vehicle_count, 2);
    assert_eq!(health.ticks, 0);

    // registration alone leaves the loop idle
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!sv.is_running());
    assert_eq!(sv.health().await.ticks, 0);
}

#[tokio::test]
async fn test_tick_loop_starts_once_and_stops() {
    let sv = Arc::new(Supervisor::new(SchedulerConfig::new(200, 2, 50)));
    sv.register(VehicleId::from("loop")).await;
    assert!(sv.start());
    assert!(!sv.start());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let health = sv.health().await;
    assert!(health.running);
    assert!(health.ticks > 0);

    sv.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!sv.is_running());
    let ticks = sv.health().await.ticks;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sv.health().await.ticks, ticks);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_command_and_tick_are_atomic() {
    let config = SchedulerConfig::default();
    let sv = Arc::new(Supervisor::new(config));
    let id = VehicleId::from("race");
    sv.register(id.clone()).await;
    sv.dispatch(&id, VehicleCommand::Arm).await;
    sv.dispatch(&id, VehicleCommand::SetControls(drive(1.0, 0.3, 0.8))).await;
    let dt = config.dt();
    let trail_len = config.snapshot_trail_len();

    for i in 0..20 {
        sv.step().await;
        let before = sv.with_vehicle(&id, |f| f.clone()).await.unwrap();
        let new_controls = drive(if i % 2 == 0 { -1.0 } else { 1.0 }, -0.7, 0.2);

        let mut cmd_first = before.clone();
        cmd_first.set_controls(new_controls);
        cmd_first.advance(dt);
        let mut tick_first = before.clone();
        tick_first.advance(dt);
        tick_first.set_controls(new_controls);

        let (sv_a, sv_b, id_a) = (Arc::clone(&sv), Arc::clone(&sv), id.clone());
        let cmd = tokio::spawn(async move { sv_a.dispatch(&id_a, VehicleCommand::SetControls(new_controls)).await });
        let tick = tokio::spawn(async move { sv_b.step().await });
        let (ack, _) = (cmd.await.unwrap(), tick.await.unwrap());
        assert_eq!(ack, Some(CommandAck::ControlsSet));

        let after = sv.list_vehicles().await.remove(0);
        assert!(
            after == cmd_first.snapshot(trail_len) || after == tick_first.snapshot(trail_len),
            "state after concurrent command and tick matches neither ordering"
        );
    }
}
