use super::flight_state::{FlightMode, NavStatus};
use crate::util::Vec3D;

/// The home pose every vehicle starts from and returns to.
pub const ORIGIN: Vec3D<f64> = Vec3D::new(0.0, 2.0, 0.0);

/// Kinematic state advanced by the flight dynamics integrator.
///
/// This is a value type: integration consumes one instance and produces the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Position in world units, `y` is altitude.
    pub position: Vec3D<f64>,
    /// Reported velocity, recomputed from `speed` and yaw on every step.
    pub velocity: Vec3D<f64>,
    /// `(pitch, yaw, roll)` in radians.
    pub rotation: Vec3D<f64>,
    pub angular_velocity: Vec3D<f64>,
    /// Signed longitudinal speed.
    pub speed: f64,
    /// Current yaw rate in rad/s.
    pub yaw_rate: f64,
}

impl Kinematics {
    pub fn yaw(&self) -> f64 { self.rotation.y() }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: ORIGIN,
            velocity: Vec3D::zero(),
            rotation: Vec3D::zero(),
            angular_velocity: Vec3D::zero(),
            speed: 0.0,
            yaw_rate: 0.0,
        }
    }
}

/// Complete per-vehicle state: kinematics plus the doctrine-relevant fields.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub(super) kinematics: Kinematics,
    /// Remaining energy in percent.
    pub(super) battery: f64,
    pub(super) armed: bool,
    pub(super) mode: FlightMode,
    /// Operator-simulated GPS interference in percent.
    pub(super) gps_jam: f64,
    /// Trust in the navigation solution in percent, follows `gps_jam`.
    pub(super) nav_confidence: f64,
    pub(super) retrograde_active: bool,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            kinematics: Kinematics::default(),
            battery: 100.0,
            armed: false,
            mode: FlightMode::Stabilize,
            gps_jam: 0.0,
            nav_confidence: 100.0,
            retrograde_active: false,
        }
    }
}

impl VehicleState {
    pub fn kinematics(&self) -> &Kinematics { &self.kinematics }
    pub fn position(&self) -> Vec3D<f64> { self.kinematics.position }
    pub fn battery(&self) -> f64 { self.battery }
    pub fn is_armed(&self) -> bool { self.armed }
    pub fn mode(&self) -> FlightMode { self.mode }
    pub fn gps_jam(&self) -> f64 { self.gps_jam }
    pub fn nav_confidence(&self) -> f64 { self.nav_confidence }
    pub fn retrograde_active(&self) -> bool { self.retrograde_active }

    /// The derived navigation status for the current state.
    pub fn status(&self) -> NavStatus {
        NavStatus::derive(self.mode, self.retrograde_active, self.nav_confidence)
    }
}

/// Raw operator control vector. Every axis is clamped to `[-1, 1]` on construction.
///
/// The ground-plane model only reads `forward`, `yaw` and `throttle`; the remaining
/// axes are stored and reported back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInputs {
    forward: f64,
    yaw: f64,
    throttle: f64,
    pitch: f64,
    roll: f64,
    yaw_rate: f64,
}

impl ControlInputs {
    pub fn new(forward: f64, yaw: f64, throttle: f64, pitch: f64, roll: f64, yaw_rate: f64) -> Self {
        Self {
            forward: Self::clamp_axis(forward),
            yaw: Self::clamp_axis(yaw),
            throttle: Self::clamp_axis(throttle),
            pitch: Self::clamp_axis(pitch),
            roll: Self::clamp_axis(roll),
            yaw_rate: Self::clamp_axis(yaw_rate),
        }
    }

    /// NaN axes are treated as neutral.
    fn clamp_axis(value: f64) -> f64 { if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) } }

    pub fn forward(&self) -> f64 { self.forward }
    pub fn yaw(&self) -> f64 { self.yaw }
    pub fn throttle(&self) -> f64 { self.throttle }
    pub fn pitch(&self) -> f64 { self.pitch }
    pub fn roll(&self) -> f64 { self.roll }
    pub fn yaw_rate(&self) -> f64 { self.yaw_rate }
}
