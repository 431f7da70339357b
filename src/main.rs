#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod console_communication;
mod flight_control;
mod util;

use crate::flight_control::{DoctrineThresholds, NavDoctrine};
use crate::util::{Keychain, SimConfig};

#[cfg(all(feature = "profiling", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = SimConfig::from_env().unwrap_or_else(|e| fatal!("Invalid configuration: {e}"));
    let keychain = Keychain::new(config)
        .await
        .unwrap_or_else(|e| fatal!("Console could not bind {}: {e}", config.bind_addr()));

    let thresholds = DoctrineThresholds::current();
    info!("Starting A.E.G.I.S. vehicle simulator.");
    info!(
        "Doctrine thresholds: WARN {}%, REJECT {}%, ABORT {}%, battery RTB {}%.",
        thresholds.warn,
        thresholds.reject,
        thresholds.abort,
        NavDoctrine::BATTERY_RTB_THRESHOLD
    );
    info!(
        "Ticking at {} Hz, broadcasting every {} ticks.",
        config.scheduler().tick_rate_hz(),
        config.scheduler().broadcast_divisor()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down.");
    keychain.shutdown();
}
