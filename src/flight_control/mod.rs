//! Vehicle simulation core: flight dynamics, navigation doctrine, per-vehicle
//! controllers and the fixed-rate scheduler driving them.

mod doctrine;
mod flight_computer;
mod flight_dynamics;
mod flight_state;
mod snapshot;
mod supervisor;
mod vehicle_id;
mod vehicle_state;

#[cfg(test)]
mod tests;

pub use doctrine::NavDoctrine;
pub use snapshot::{DoctrineThresholds, VehicleSnapshot};
pub use supervisor::{CommandAck, HealthReport, Supervisor, VehicleCommand};
pub use vehicle_id::VehicleId;
pub use vehicle_state::ControlInputs;
