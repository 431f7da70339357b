use super::{
    flight_dynamics::FlightDynamics,
    flight_state::FlightMode,
    vehicle_state::{ORIGIN, VehicleState},
};
use crate::util::{LinkedBox, Vec3D};
use std::collections::VecDeque;

/// Outcome of a single autonomous return step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnStep {
    /// The vehicle flew towards the current waypoint.
    Steering,
    /// An intermediate waypoint was reached, the contained one is the new target.
    WaypointReached(Vec3D<f64>),
    /// The origin was reached, the vehicle landed and disarmed.
    Landed,
    /// Return mode was left because no target was set.
    Aborted,
}

/// The navigation doctrine engine and its data for one vehicle.
///
/// It tracks the breadcrumb trail, the operator-verified anchors and the return path,
/// and drives confidence, autonomous return and battery policy on a [`VehicleState`].
#[derive(Debug, Clone, PartialEq)]
pub struct NavDoctrine {
    /// Automatically recorded trail, oldest first.
    breadcrumbs: LinkedBox<Vec3D<f64>>,
    /// Anchors in the order they were logged.
    anchors: Vec<Vec3D<f64>>,
    /// Remaining waypoints of the active return, consumed from the front.
    return_queue: VecDeque<Vec3D<f64>>,
    /// The waypoint currently flown to.
    target_point: Option<Vec3D<f64>>,
    /// Simulated time of the last breadcrumb capture, in seconds.
    last_breadcrumb_time: f64,
}

impl Default for NavDoctrine {
    fn default() -> Self {
        Self {
            breadcrumbs: LinkedBox::new(Self::MAX_BREADCRUMBS),
            anchors: Vec::new(),
            return_queue: VecDeque::new(),
            target_point: None,
            last_breadcrumb_time: 0.0,
        }
    }
}

impl NavDoctrine {
    /// Above this confidence the status is nominal.
    pub const THRESH_WARN: f64 = 70.0;
    /// Below this confidence anchors are rejected.
    pub const THRESH_REJECT: f64 = 40.0;
    /// Below this confidence an autonomous return is triggered.
    pub const THRESH_ABORT: f64 = 10.0;
    /// Below this battery level an autonomous return is triggered.
    pub const BATTERY_RTB_THRESHOLD: f64 = 15.0;
    /// Confidence lost per percent of GPS jamming, 80 % jam maps onto the abort threshold.
    const JAM_CONFIDENCE_SLOPE: f64 = 1.125;
    /// Rate of the exponential approach towards the target confidence.
    const CONFIDENCE_SMOOTHING: f64 = 3.0;
    /// Confidence after a completed return.
    const LANDED_CONFIDENCE: f64 = 50.0;
    /// Horizontal distance at which a waypoint counts as reached.
    const ARRIVAL_TOLERANCE: f64 = 1.0;
    const MAX_BREADCRUMBS: usize = 500;
    /// Minimum simulated time between two breadcrumbs.
    const BREADCRUMB_INTERVAL: f64 = 0.2;
    /// Slack for rounding in the accumulated simulation clock.
    const CLOCK_EPS: f64 = 1e-9;
    /// Battery drain in percent per second while moving.
    const BATTERY_DRAIN_RATE: f64 = 0.5;
    /// Speeds at or below this magnitude do not drain the battery.
    const DRAIN_SPEED_EPS: f64 = 0.1;

    pub fn breadcrumbs(&self) -> &LinkedBox<Vec3D<f64>> { &self.breadcrumbs }
    pub fn anchors(&self) -> &[Vec3D<f64>] { &self.anchors }
    pub fn return_queue(&self) -> &VecDeque<Vec3D<f64>> { &self.return_queue }
    pub fn target_point(&self) -> Option<Vec3D<f64>> { self.target_point }

    /// The confidence a given jamming level settles at.
    pub fn target_confidence(gps_jam: f64) -> f64 {
        (100.0 - gps_jam * Self::JAM_CONFIDENCE_SLOPE).clamp(0.0, 100.0)
    }

    /// Moves the navigation confidence towards the value implied by the jamming level.
    /// Confidence is frozen while a return is active.
    pub fn update_confidence(state: &mut VehicleState, dt: f64) {
        if state.retrograde_active {
            return;
        }
        let target = Self::target_confidence(state.gps_jam);
        let current = state.nav_confidence;
        state.nav_confidence =
            (current + (target - current) * Self::CONFIDENCE_SMOOTHING * dt).clamp(0.0, 100.0);
    }

    /// Whether the doctrine demands an autonomous return right now.
    pub fn should_abort(state: &VehicleState) -> bool {
        !state.retrograde_active
            && (state.nav_confidence < Self::THRESH_ABORT
                || state.battery < Self::BATTERY_RTB_THRESHOLD)
    }

    /// Enters autonomous return.
    ///
    /// The return path visits every anchor, newest first, and always ends at the origin.
    ///
    /// # Arguments
    /// * `state` - The vehicle state to switch into return mode.
    /// * `commander_override` - Whether the return was ordered by the operator.
    pub fn start_retrograde(&mut self, state: &mut VehicleState, commander_override: bool) {
        state.retrograde_active = true;
        state.mode = if commander_override { FlightMode::CommanderRtb } else { FlightMode::Retrograde };

        self.return_queue = self.anchors.iter().rev().copied().collect();
        self.return_queue.push_back(ORIGIN);
        self.target_point = self.return_queue.pop_front();
    }

    /// Advances an active return by one step.
    pub fn advance_retrograde(&mut self, state: &mut VehicleState, dt: f64) -> ReturnStep {
        let Some(target) = self.target_point else {
            state.retrograde_active = false;
            state.mode = FlightMode::Stabilize;
            return ReturnStep::Aborted;
        };

        if state.kinematics.position.horizontal_distance(&target) < Self::ARRIVAL_TOLERANCE {
            if let Some(next) = self.return_queue.pop_front() {
                self.target_point = Some(next);
                return ReturnStep::WaypointReached(next);
            }
            self.land(state);
            return ReturnStep::Landed;
        }

        state.kinematics = FlightDynamics::steer_towards(state.kinematics, target, dt);
        ReturnStep::Steering
    }

    /// Finishes a return at the origin: disarmed, stationary, partially recovered.
    fn land(&mut self, state: &mut VehicleState) {
        self.target_point = None;
        state.retrograde_active = false;
        state.mode = FlightMode::Landed;
        state.nav_confidence = Self::LANDED_CONFIDENCE;
        state.armed = false;
        state.kinematics.speed = 0.0;
        state.kinematics.yaw_rate = 0.0;
        state.kinematics.position = ORIGIN;
        state.kinematics.velocity = Vec3D::zero();
    }

    /// Logs the current position as an anchor if navigation is trustworthy enough.
    ///
    /// # Returns
    /// - `Some(position)` if the anchor was appended.
    /// - `None` if confidence is below [`Self::THRESH_REJECT`]; nothing is changed.
    pub fn log_anchor(&mut self, state: &VehicleState) -> Option<Vec3D<f64>> {
        if state.nav_confidence >= Self::THRESH_REJECT {
            let pos = state.kinematics.position;
            self.anchors.push(pos);
            Some(pos)
        } else {
            None
        }
    }

    /// Records a breadcrumb if enough simulated time passed since the last one.
    pub fn capture_breadcrumb(&mut self, state: &VehicleState, now: f64) -> bool {
        if now - self.last_breadcrumb_time >= Self::BREADCRUMB_INTERVAL - Self::CLOCK_EPS {
            self.breadcrumbs.push(state.kinematics.position);
            self.last_breadcrumb_time = now;
            true
        } else {
            false
        }
    }

    /// Clears the trail and restarts the capture clock, used when arming.
    pub fn restart_trail(&mut self, now: f64) {
        self.breadcrumbs.clear();
        self.last_breadcrumb_time = now;
    }

    /// Drains the battery while moving and disarms on an empty battery.
    ///
    /// # Returns
    /// `true` if the vehicle was disarmed by this call.
    pub fn drain_battery(state: &mut VehicleState, dt: f64) -> bool {
        if state.kinematics.speed.abs() > Self::DRAIN_SPEED_EPS {
            state.battery = (state.battery - Self::BATTERY_DRAIN_RATE * dt).max(0.0);
        }
        if state.battery <= 0.0 && state.armed {
            state.armed = false;
            return true;
        }
        false
    }
}
