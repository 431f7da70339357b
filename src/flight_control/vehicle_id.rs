use rand::Rng;
use std::fmt::Display;

/// Opaque identity of a simulated vehicle, assigned by the transport on connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(String);

impl VehicleId {
    /// Generates a fresh random identity in the usual 8-4-4-4-12 hex layout.
    pub fn random() -> Self {
        let raw: u128 = rand::rng().random();
        let hex = format!("{raw:032x}");
        Self(format!("{}-{}-{}-{}-{}", &hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32]))
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}
