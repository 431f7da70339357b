use super::{
    doctrine::{NavDoctrine, ReturnStep},
    flight_dynamics::FlightDynamics,
    snapshot::VehicleSnapshot,
    vehicle_id::VehicleId,
    vehicle_state::{ControlInputs, VehicleState},
};
use crate::util::Vec3D;
use crate::{event, nav};

/// Per-vehicle controller composing the flight dynamics integrator and the
/// navigation doctrine engine.
///
/// All mutation of a vehicle goes through this type, either through one of the
/// operator commands or through [`FlightComputer::advance`] once per scheduler step.
#[derive(Debug, Clone)]
pub struct FlightComputer {
    /// Identity of the controlled vehicle, used for logging and snapshots.
    id: VehicleId,
    /// Kinematic and doctrine-relevant vehicle state.
    state: VehicleState,
    /// Trail, anchors and return path.
    doctrine: NavDoctrine,
    /// Latest operator inputs.
    controls: ControlInputs,
    /// Simulated time in seconds, advanced only while armed.
    sim_time: f64,
}

impl FlightComputer {
    /// Battery level at or below which arming recharges the vehicle.
    const ARM_RECHARGE_THRESHOLD: f64 = 10.0;

    /// Creates a new controller with a vehicle resting at the origin.
    pub fn new(id: VehicleId) -> Self {
        Self {
            id,
            state: VehicleState::default(),
            doctrine: NavDoctrine::default(),
            controls: ControlInputs::default(),
            sim_time: 0.0,
        }
    }

    pub fn id(&self) -> &VehicleId { &self.id }
    pub fn state(&self) -> &VehicleState { &self.state }
    pub fn doctrine(&self) -> &NavDoctrine { &self.doctrine }
    pub fn sim_time(&self) -> f64 { self.sim_time }

    /// Arms the vehicle. A nearly empty battery is swapped for a full one and the
    /// breadcrumb trail starts over.
    pub fn arm(&mut self) {
        if self.state.battery <= Self::ARM_RECHARGE_THRESHOLD {
            self.state.battery = 100.0;
        }
        self.state.armed = true;
        if !self.doctrine.breadcrumbs().is_empty() {
            event!("[{}] Discarding trail of {} breadcrumbs.", self.id, self.doctrine.breadcrumbs().len());
        }
        self.doctrine.restart_trail(self.sim_time);
    }

    pub fn disarm(&mut self) { self.state.armed = false; }

    /// Restores state, doctrine data and controls to their defaults.
    pub fn reset(&mut self) {
        self.state = VehicleState::default();
        self.doctrine = NavDoctrine::default();
        self.controls = ControlInputs::default();
    }

    pub fn set_controls(&mut self, controls: ControlInputs) { self.controls = controls; }

    /// Shifts the simulated GPS jamming level by `delta`, clamped to `[0, 100]`.
    ///
    /// # Returns
    /// The new jamming level.
    pub fn adjust_jam(&mut self, delta: f64) -> f64 {
        if delta.is_finite() {
            self.state.gps_jam = (self.state.gps_jam + delta).clamp(0.0, 100.0);
        }
        self.state.gps_jam
    }

    /// Attempts to log the current position as an anchor.
    pub fn log_anchor(&mut self) -> Option<Vec3D<f64>> {
        let anchor = self.doctrine.log_anchor(&self.state);
        match anchor {
            Some(pos) => nav!("[{}] Anchor #{} logged at {pos}.", self.id, self.doctrine.anchors().len()),
            None => nav!(
                "[{}] Anchor rejected, confidence {:.1} below {}.",
                self.id,
                self.state.nav_confidence,
                NavDoctrine::THRESH_REJECT
            ),
        }
        anchor
    }

    /// Commander override: starts a return regardless of confidence and battery.
    pub fn force_return(&mut self) {
        self.doctrine.start_retrograde(&mut self.state, true);
        nav!(
            "[{}] COMMANDER OVERRIDE: returning via {} anchor(s).",
            self.id,
            self.doctrine.anchors().len()
        );
    }

    /// Advances the vehicle by one simulation step. Disarmed vehicles are frozen.
    pub fn advance(&mut self, dt: f64) {
        if !self.state.armed {
            return;
        }
        self.sim_time += dt;

        NavDoctrine::update_confidence(&mut self.state, dt);

        if NavDoctrine::should_abort(&self.state) {
            self.doctrine.start_retrograde(&mut self.state, false);
            nav!(
                "[{}] Autonomous return from {}: confidence {:.1}, battery {:.1}.",
                self.id,
                self.state.position(),
                self.state.nav_confidence(),
                self.state.battery()
            );
        }

        if self.state.retrograde_active {
            match self.doctrine.advance_retrograde(&mut self.state, dt) {
                ReturnStep::WaypointReached(next) => {
                    nav!("[{}] Waypoint reached, heading for {next}.", self.id);
                }
                ReturnStep::Landed => nav!("[{}] Arrived at origin, landed and disarmed.", self.id),
                ReturnStep::Aborted => event!("[{}] Return left without target.", self.id),
                ReturnStep::Steering => {}
            }
        } else {
            self.state.kinematics =
                FlightDynamics::advance_normal(self.state.kinematics, &self.controls, dt);
        }

        self.doctrine.capture_breadcrumb(&self.state, self.sim_time);

        if NavDoctrine::drain_battery(&mut self.state, dt) {
            nav!("[{}] Battery depleted, vehicle disarmed.", self.id);
        }
    }

    /// Takes an immutable snapshot, keeping only the `trail_len` newest breadcrumbs.
    pub fn snapshot(&self, trail_len: usize) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_id: self.id.clone(),
            kinematics: *self.state.kinematics(),
            battery: self.state.battery(),
            armed: self.state.is_armed(),
            mode: self.state.mode(),
            status: self.state.status(),
            gps_jam: self.state.gps_jam(),
            nav_confidence: self.state.nav_confidence(),
            retrograde_active: self.state.retrograde_active(),
            breadcrumbs: self.doctrine.breadcrumbs().latest(trail_len).copied().collect(),
            anchors: self.doctrine.anchors().to_vec(),
            target_point: self.doctrine.target_point(),
            return_queue_len: self.doctrine.return_queue().len(),
            controls: self.controls,
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut VehicleState { &mut self.state }
}
