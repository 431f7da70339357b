use super::{
    doctrine::NavDoctrine,
    flight_state::{FlightMode, NavStatus},
    vehicle_id::VehicleId,
    vehicle_state::{ControlInputs, Kinematics},
};
use crate::util::Vec3D;
use chrono::{DateTime, Utc};

/// Immutable copy of one vehicle's state, taken under the scheduler lock.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleId,
    pub kinematics: Kinematics,
    pub battery: f64,
    pub armed: bool,
    pub mode: FlightMode,
    pub status: NavStatus,
    pub gps_jam: f64,
    pub nav_confidence: f64,
    pub retrograde_active: bool,
    /// The most recent breadcrumbs, oldest first.
    pub breadcrumbs: Vec<Vec3D<f64>>,
    pub anchors: Vec<Vec3D<f64>>,
    pub target_point: Option<Vec3D<f64>>,
    pub return_queue_len: usize,
    pub controls: ControlInputs,
}

/// All vehicle snapshots published by one scheduler step.
#[derive(Debug, Clone)]
pub struct SnapshotFrame {
    /// Scheduler step the frame was taken after.
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub vehicles: Vec<VehicleSnapshot>,
}

/// The doctrine thresholds announced to clients on connect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoctrineThresholds {
    pub warn: f64,
    pub reject: f64,
    pub abort: f64,
}

impl DoctrineThresholds {
    pub const fn current() -> Self {
        Self {
            warn: NavDoctrine::THRESH_WARN,
            reject: NavDoctrine::THRESH_REJECT,
            abort: NavDoctrine::THRESH_ABORT,
        }
    }
}
