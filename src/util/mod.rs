mod config;
mod keychain;
mod linked_box;
pub mod logger;
mod vec3d;


pub use config::{SchedulerConfig, SimConfig};
pub use keychain::Keychain;
pub use linked_box::LinkedBox;
pub use vec3d::{Vec3D, wrap_angle};
