use super::vehicle_state::{ControlInputs, Kinematics};
use crate::util::{Vec3D, wrap_angle};

/// Ground-plane flight model.
///
/// Longitudinal speed and yaw rate are first-order responses to the operator inputs,
/// altitude is driven directly by throttle. There is no aerodynamic or collision model.
pub struct FlightDynamics;

impl FlightDynamics {
    /// Maximum forward speed in units/s.
    pub const MAX_SPEED: f64 = 8.0;
    /// Maximum reverse speed in units/s.
    pub const MAX_REVERSE_SPEED: f64 = 4.0;
    /// Forward acceleration in units/s².
    const ACCELERATION: f64 = 12.0;
    /// Reverse acceleration in units/s².
    const DECELERATION: f64 = 10.0;
    /// Per-step speed decay without forward input.
    const DRAG: f64 = 0.96;
    /// Per-step yaw rate decay without yaw input.
    const YAW_DAMPING: f64 = 0.85;
    /// Below this magnitude, decaying speed and yaw rate snap to zero.
    const SNAP_EPS: f64 = 0.05;
    const BASE_YAW_RATE: f64 = 2.5;
    /// Speed at which yaw authority saturates.
    const YAW_REF_SPEED: f64 = 6.0;
    /// Throttle dead band, below it altitude is held.
    const THROTTLE_DEADBAND: f64 = 0.1;
    const CLIMB_RATE: f64 = 5.0;
    const MAX_ALTITUDE: f64 = 100.0;
    /// Fixed cruise speed of autonomous return legs.
    pub const RETURN_SPEED: f64 = 6.0;
    /// Proportional heading gain of the return autopilot.
    const RETURN_TURN_GAIN: f64 = 4.0;

    /// Advances the kinematic state by `dt` under operator control.
    ///
    /// # Arguments
    /// * `kin` - The current kinematic state.
    /// * `controls` - The (pre-clamped) operator inputs.
    /// * `dt` - The timestep in seconds.
    ///
    /// # Returns
    /// The kinematic state after `dt`.
    pub fn advance_normal(kin: Kinematics, controls: &ControlInputs, dt: f64) -> Kinematics {
        let speed = Self::next_speed(kin.speed, controls.forward(), dt);
        let yaw_rate = Self::next_yaw_rate(kin.yaw_rate, speed, controls.yaw());
        let yaw = kin.yaw() + yaw_rate * dt;

        let ground_step = Vec3D::from_heading(yaw, speed * dt);
        let mut altitude = kin.position.y();
        if controls.throttle() > Self::THROTTLE_DEADBAND {
            altitude += (controls.throttle() - 0.5) * Self::CLIMB_RATE * dt;
            altitude = altitude.clamp(0.0, Self::MAX_ALTITUDE);
        }
        let position = (kin.position + ground_step).with_y(altitude.max(0.0));

        Kinematics {
            position,
            velocity: Vec3D::from_heading(yaw, speed),
            rotation: kin.rotation.with_y(yaw),
            speed,
            yaw_rate,
            ..kin
        }
    }

    /// Flies one autopilot step towards `target` at [`Self::RETURN_SPEED`].
    ///
    /// Heading is corrected proportionally to the wrapped heading error; altitude is
    /// left untouched.
    pub fn steer_towards(kin: Kinematics, target: Vec3D<f64>, dt: f64) -> Kinematics {
        let desired_yaw = kin.position.heading_to(&target);
        let error = wrap_angle(desired_yaw - kin.yaw());
        let yaw = kin.yaw() + error * Self::RETURN_TURN_GAIN * dt;

        Kinematics {
            position: kin.position + Vec3D::from_heading(yaw, Self::RETURN_SPEED * dt),
            velocity: Vec3D::from_heading(yaw, Self::RETURN_SPEED),
            rotation: kin.rotation.with_y(yaw),
            speed: Self::RETURN_SPEED,
            ..kin
        }
    }

    fn next_speed(speed: f64, forward: f64, dt: f64) -> f64 {
        if forward > 0.0 {
            (speed + Self::ACCELERATION * dt * forward).min(Self::MAX_SPEED)
        } else if forward < 0.0 {
            (speed + Self::DECELERATION * dt * forward).max(-Self::MAX_REVERSE_SPEED)
        } else {
            let decayed = speed * Self::DRAG;
            if decayed.abs() < Self::SNAP_EPS { 0.0 } else { decayed }
        }
    }

    fn next_yaw_rate(yaw_rate: f64, speed: f64, yaw_input: f64) -> f64 {
        let speed_factor = (speed.abs() / Self::YAW_REF_SPEED).min(1.0);
        if yaw_input == 0.0 {
            let decayed = yaw_rate * Self::YAW_DAMPING;
            if decayed.abs() < Self::SNAP_EPS { 0.0 } else { decayed }
        } else {
            yaw_input * Self::BASE_YAW_RATE * (0.5 + speed_factor)
        }
    }
}
