//! Protobuf schema of the operator console protocol.

use crate::flight_control::{ControlInputs, DoctrineThresholds, HealthReport, VehicleSnapshot};
use crate::util::Vec3D;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Upstream {
    #[prost(oneof = "UpstreamContent", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub content: Option<UpstreamContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Downstream {
    #[prost(oneof = "DownstreamContent", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub content: Option<DownstreamContent>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum UpstreamContent {
    #[prost(message, tag = "1")]
    Ping(Ping),
    #[prost(message, tag = "2")]
    Arm(VehicleRef),
    #[prost(message, tag = "3")]
    Disarm(VehicleRef),
    #[prost(message, tag = "4")]
    Reset(VehicleRef),
    #[prost(message, tag = "5")]
    SetControls(SetControls),
    #[prost(message, tag = "6")]
    AdjustJam(AdjustJam),
    #[prost(message, tag = "7")]
    CommanderOverride(VehicleRef),
    #[prost(message, tag = "8")]
    LogAnchor(VehicleRef),
    #[prost(message, tag = "9")]
    GetHealth(GetHealth),
    #[prost(message, tag = "10")]
    ListVehicles(ListVehicles),
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum DownstreamContent {
    #[prost(message, tag = "1")]
    Pong(Pong),
    #[prost(message, tag = "2")]
    DroneCreated(DroneCreated),
    #[prost(message, tag = "3")]
    DroneUpdate(VehicleTelemetry),
    #[prost(message, tag = "4")]
    Status(Status),
    #[prost(message, tag = "5")]
    JamChanged(JamChanged),
    #[prost(message, tag = "6")]
    AnchorLogged(AnchorLogged),
    #[prost(message, tag = "7")]
    Health(Health),
    #[prost(message, tag = "8")]
    VehicleList(VehicleList),
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ping {
    #[prost(string, optional, tag = "1")]
    pub echo: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Pong {
    #[prost(string, optional, tag = "1")]
    pub echo: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VehicleRef {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetControls {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(double, tag = "2")]
    pub forward: f64,
    #[prost(double, tag = "3")]
    pub yaw: f64,
    #[prost(double, tag = "4")]
    pub throttle: f64,
    #[prost(double, tag = "5")]
    pub pitch: f64,
    #[prost(double, tag = "6")]
    pub roll: f64,
    #[prost(double, tag = "7")]
    pub yaw_rate: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdjustJam {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(double, tag = "2")]
    pub delta: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetHealth {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListVehicles {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Vector3 {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Controls {
    #[prost(double, tag = "1")]
    pub forward: f64,
    #[prost(double, tag = "2")]
    pub yaw: f64,
    #[prost(double, tag = "3")]
    pub throttle: f64,
    #[prost(double, tag = "4")]
    pub pitch: f64,
    #[prost(double, tag = "5")]
    pub roll: f64,
    #[prost(double, tag = "6")]
    pub yaw_rate: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Thresholds {
    #[prost(double, tag = "1")]
    pub warn: f64,
    #[prost(double, tag = "2")]
    pub reject: f64,
    #[prost(double, tag = "3")]
    pub abort: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VehicleTelemetry {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(message, optional, tag = "2")]
    pub position: Option<Vector3>,
    #[prost(message, optional, tag = "3")]
    pub velocity: Option<Vector3>,
    #[prost(message, optional, tag = "4")]
    pub rotation: Option<Vector3>,
    #[prost(message, optional, tag = "5")]
    pub angular_velocity: Option<Vector3>,
    #[prost(double, tag = "6")]
    pub speed: f64,
    #[prost(double, tag = "7")]
    pub battery: f64,
    #[prost(bool, tag = "8")]
    pub armed: bool,
    #[prost(string, tag = "9")]
    pub mode: String,
    #[prost(string, tag = "10")]
    pub status: String,
    #[prost(double, tag = "11")]
    pub gps_jam: f64,
    #[prost(double, tag = "12")]
    pub nav_confidence: f64,
    #[prost(bool, tag = "13")]
    pub retrograde_active: bool,
    #[prost(message, repeated, tag = "14")]
    pub breadcrumbs: Vec<Vector3>,
    #[prost(message, repeated, tag = "15")]
    pub anchors: Vec<Vector3>,
    #[prost(message, optional, tag = "16")]
    pub target_point: Option<Vector3>,
    #[prost(uint32, tag = "17")]
    pub return_queue_length: u32,
    #[prost(message, optional, tag = "18")]
    pub controls: Option<Controls>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DroneCreated {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(message, optional, tag = "2")]
    pub initial_state: Option<VehicleTelemetry>,
    #[prost(message, optional, tag = "3")]
    pub thresholds: Option<Thresholds>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JamChanged {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(double, tag = "2")]
    pub level: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AnchorLogged {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(bool, tag = "2")]
    pub success: bool,
    #[prost(message, optional, tag = "3")]
    pub position: Option<Vector3>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Health {
    #[prost(bool, tag = "1")]
    pub healthy: bool,
    #[prost(bool, tag = "2")]
    pub running: bool,
    #[prost(uint32, tag = "3")]
    pub vehicles: u32,
    #[prost(uint64, tag = "4")]
    pub ticks: u64,
    /// Unix timestamp in milliseconds.
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VehicleList {
    #[prost(message, repeated, tag = "1")]
    pub vehicles: Vec<VehicleTelemetry>,
}

impl From<Vec3D<f64>> for Vector3 {
    fn from(v: Vec3D<f64>) -> Self { Self { x: v.x(), y: v.y(), z: v.z() } }
}

impl From<&ControlInputs> for Controls {
    fn from(c: &ControlInputs) -> Self {
        Self {
            forward: c.forward(),
            yaw: c.yaw(),
            throttle: c.throttle(),
            pitch: c.pitch(),
            roll: c.roll(),
            yaw_rate: c.yaw_rate(),
        }
    }
}

impl From<&SetControls> for ControlInputs {
    fn from(s: &SetControls) -> Self {
        ControlInputs::new(s.forward, s.yaw, s.throttle, s.pitch, s.roll, s.yaw_rate)
    }
}

impl From<DoctrineThresholds> for Thresholds {
    fn from(t: DoctrineThresholds) -> Self { Self { warn: t.warn, reject: t.reject, abort: t.abort } }
}

impl From<&HealthReport> for Health {
    #[allow(clippy::cast_possible_truncation)]
    fn from(h: &HealthReport) -> Self {
        Self {
            healthy: h.healthy,
            running: h.running,
            vehicles: h.vehicle_count as u32,
            ticks: h.ticks,
            timestamp: h.timestamp.timestamp_millis(),
        }
    }
}

impl From<&VehicleSnapshot> for VehicleTelemetry {
    #[allow(clippy::cast_possible_truncation)]
    fn from(s: &VehicleSnapshot) -> Self {
        let kin = &s.kinematics;
        Self {
            vehicle_id: s.vehicle_id.to_string(),
            position: Some(kin.position.into()),
            velocity: Some(kin.velocity.into()),
            rotation: Some(kin.rotation.into()),
            angular_velocity: Some(kin.angular_velocity.into()),
            speed: kin.speed,
            battery: s.battery,
            armed: s.armed,
            mode: s.mode.to_string(),
            status: s.status.to_string(),
            gps_jam: s.gps_jam,
            nav_confidence: s.nav_confidence,
            retrograde_active: s.retrograde_active,
            breadcrumbs: s.breadcrumbs.iter().copied().map(Vector3::from).collect(),
            anchors: s.anchors.iter().copied().map(Vector3::from).collect(),
            target_point: s.target_point.map(Vector3::from),
            return_queue_length: s.return_queue_len as u32,
            controls: Some(Controls::from(&s.controls)),
        }
    }
}
