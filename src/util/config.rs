use std::{env, net::SocketAddr, str::FromStr, time::Duration};
use strum_macros::Display;

/// Runtime configuration, read once from the environment at startup.
///
/// | Variable                  | Default        |
/// |---------------------------|----------------|
/// | `AEGIS_BIND_ADDR`         | `0.0.0.0:1337` |
/// | `AEGIS_TICK_HZ`           | `60`           |
/// | `AEGIS_BROADCAST_DIVISOR` | `2`            |
/// | `AEGIS_TRAIL_LEN`         | `50`           |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Address the operator console listens on.
    bind_addr: SocketAddr,
    /// Scheduler settings.
    scheduler: SchedulerConfig,
}

/// Cadence and snapshot settings of the simulation scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Fixed number of simulation steps per second.
    tick_rate_hz: u32,
    /// A snapshot frame is published every `broadcast_divisor`-th step.
    broadcast_divisor: u32,
    /// Number of most recent breadcrumbs included in each snapshot.
    snapshot_trail_len: usize,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[strum(to_string = "'{value}' is not a valid socket address for {var}")]
    InvalidAddress { var: &'static str, value: String },
    #[strum(to_string = "'{value}' is not a valid positive integer for {var}")]
    InvalidNumber { var: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:1337";

    /// Builds the configuration from `AEGIS_*` environment variables, falling back to
    /// defaults for unset variables.
    ///
    /// # Returns
    /// - `Ok(SimConfig)` if every set variable parses.
    /// - `Err(ConfigError)` naming the first offending variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`SimConfig::from_env`], but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&'static str) -> Option<String> {
        let bind_var = "AEGIS_BIND_ADDR";
        let bind_raw = lookup(bind_var).unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string());
        let bind_addr = SocketAddr::from_str(bind_raw.trim())
            .map_err(|_| ConfigError::InvalidAddress { var: bind_var, value: bind_raw.clone() })?;

        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig::new(
            parse_positive(&lookup, "AEGIS_TICK_HZ", defaults.tick_rate_hz)?,
            parse_positive(&lookup, "AEGIS_BROADCAST_DIVISOR", defaults.broadcast_divisor)?,
            parse_positive(&lookup, "AEGIS_TRAIL_LEN", defaults.snapshot_trail_len)?,
        );
        Ok(Self { bind_addr, scheduler })
    }

    pub fn bind_addr(&self) -> SocketAddr { self.bind_addr }
    pub fn scheduler(&self) -> SchedulerConfig { self.scheduler }
}

impl SchedulerConfig {
    pub fn new(tick_rate_hz: u32, broadcast_divisor: u32, snapshot_trail_len: usize) -> Self {
        Self { tick_rate_hz: tick_rate_hz.max(1), broadcast_divisor: broadcast_divisor.max(1), snapshot_trail_len }
    }

    pub fn tick_rate_hz(&self) -> u32 { self.tick_rate_hz }
    pub fn broadcast_divisor(&self) -> u32 { self.broadcast_divisor }
    pub fn snapshot_trail_len(&self) -> usize { self.snapshot_trail_len }

    /// Simulation timestep in seconds.
    pub fn dt(&self) -> f64 { 1.0 / f64::from(self.tick_rate_hz) }

    /// Wall-clock period between two steps.
    pub fn tick_period(&self) -> Duration { Duration::from_secs_f64(self.dt()) }
}

impl Default for SchedulerConfig {
    fn default() -> Self { Self::new(60, 2, 50) }
}

fn parse_positive<F, N>(lookup: &F, var: &'static str, default: N) -> Result<N, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    N: FromStr + PartialOrd + Default,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<N>() {
            Ok(val) if val > N::default() => Ok(val),
            _ => Err(ConfigError::InvalidNumber { var, value: raw }),
        },
    }
}
