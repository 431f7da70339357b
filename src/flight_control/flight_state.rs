use super::doctrine::NavDoctrine;
use strum_macros::Display;

/// Flight mode of a single vehicle.
///
/// Only the doctrine engine moves a vehicle out of [`FlightMode::Stabilize`];
/// [`FlightMode::Retrograde`] and [`FlightMode::CommanderRtb`] are the two autonomous
/// return modes, [`FlightMode::Landed`] is entered after arriving at the origin.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightMode {
    #[default]
    Stabilize,
    Retrograde,
    CommanderRtb,
    Landed,
}

/// Navigation integrity status, always derived and never commanded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NavStatus {
    Nominal,
    Warning,
    SafetyOverride,
    CommanderRtb,
}

impl NavStatus {
    /// Derives the status from mode, return flag and navigation confidence.
    ///
    /// A commander-ordered return stays visible for its whole duration, any other
    /// return is a safety override. Outside of a return the confidence bands decide.
    pub fn derive(mode: FlightMode, retrograde_active: bool, nav_confidence: f64) -> Self {
        if mode == FlightMode::CommanderRtb {
            NavStatus::CommanderRtb
        } else if retrograde_active {
            NavStatus::SafetyOverride
        } else if nav_confidence > NavDoctrine::THRESH_WARN {
            NavStatus::Nominal
        } else if nav_confidence > NavDoctrine::THRESH_REJECT {
            NavStatus::Warning
        } else {
            NavStatus::SafetyOverride
        }
    }
}
