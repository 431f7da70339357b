use super::{
    flight_computer::FlightComputer,
    snapshot::{SnapshotFrame, VehicleSnapshot},
    vehicle_id::VehicleId,
    vehicle_state::ControlInputs,
};
use crate::util::{SchedulerConfig, Vec3D};
use crate::{info, log};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::{
    sync::{Mutex, broadcast},
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

/// Operator commands addressed to a single vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleCommand {
    Arm,
    Disarm,
    Reset,
    SetControls(ControlInputs),
    LogAnchor,
    /// Commander override, forces an autonomous return.
    ForceReturn,
    AdjustJam(f64),
}

/// Result of a command applied to an existing vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandAck {
    Armed,
    Disarmed,
    Reset,
    ControlsSet,
    /// `Some(position)` if the anchor was accepted.
    AnchorLogged(Option<Vec3D<f64>>),
    ReturnForced,
    JamChanged(f64),
}

/// Diagnostics returned by [`Supervisor::health`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReport {
    pub healthy: bool,
    /// Whether the tick loop is currently running.
    pub running: bool,
    pub vehicle_count: usize,
    /// Number of steps executed since creation.
    pub ticks: u64,
    pub timestamp: DateTime<Utc>,
}

/// The simulation scheduler.
///
/// Owns every [`FlightComputer`] behind a single lock, advances them at a fixed rate
/// and publishes a [`SnapshotFrame`] every few steps on a broadcast channel.
pub struct Supervisor {
    /// All registered vehicles. Ticks and commands both take this lock.
    fleet: Mutex<HashMap<VehicleId, FlightComputer>>,
    /// Cadence and snapshot settings.
    config: SchedulerConfig,
    /// Sender for snapshot frames, subscribers are created on demand.
    snapshot_tx: broadcast::Sender<Arc<SnapshotFrame>>,
    /// Executed step counter.
    ticks: AtomicU64,
    /// Set once the tick loop was spawned.
    started: AtomicBool,
    /// Set while the tick loop is alive.
    running: AtomicBool,
    /// Cancels the tick loop.
    c_tok: CancellationToken,
}

impl Supervisor {
    /// Capacity of the snapshot broadcast channel, slower receivers skip frames.
    const SNAPSHOT_CHANNEL_CAP: usize = 64;

    pub fn new(config: SchedulerConfig) -> Self {
        let (snapshot_tx, _) = broadcast::channel(Self::SNAPSHOT_CHANNEL_CAP);
        Self {
            fleet: Mutex::new(HashMap::new()),
            config,
            snapshot_tx,
            ticks: AtomicU64::new(0),
            started: AtomicBool::new(false),
            running: AtomicBool::new(false),
            c_tok: CancellationToken::new(),
        }
    }

    /// Subscribes to snapshot frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SnapshotFrame>> { self.snapshot_tx.subscribe() }

    /// Registers a new vehicle. An existing vehicle with the same id is replaced.
    ///
    /// Registration does not start the tick loop. Whoever registers the first vehicle
    /// calls [`Supervisor::start`] afterwards, as the console does on every connect.
    ///
    /// # Returns
    /// A snapshot of the freshly created vehicle.
    pub async fn register(&self, id: VehicleId) -> VehicleSnapshot {
        let f_cont = FlightComputer::new(id.clone());
        let snapshot = f_cont.snapshot(self.config.snapshot_trail_len());
        let count = {
            let mut fleet = self.fleet.lock().await;
            fleet.insert(id.clone(), f_cont);
            fleet.len()
        };
        info!("Vehicle {id} registered, {count} active.");
        snapshot
    }

    /// Removes a vehicle.
    ///
    /// # Returns
    /// `true` if the vehicle existed.
    pub async fn deregister(&self, id: &VehicleId) -> bool {
        let (removed, count) = {
            let mut fleet = self.fleet.lock().await;
            (fleet.remove(id), fleet.len())
        };
        let Some(f_cont) = removed else { return false };
        info!(
            "Vehicle {} deregistered after {:.1}s armed, battery {:.1}, {} anchor(s). {count} active.",
            f_cont.id(),
            f_cont.sim_time(),
            f_cont.state().battery(),
            f_cont.doctrine().anchors().len()
        );
        true
    }

    /// Applies `cmd` to the vehicle `id`.
    ///
    /// # Returns
    /// - `Some(CommandAck)` if the vehicle exists.
    /// - `None` for unknown ids, which are treated as stale messages and ignored.
    pub async fn dispatch(&self, id: &VehicleId, cmd: VehicleCommand) -> Option<CommandAck> {
        let mut fleet = self.fleet.lock().await;
        let f_cont = fleet.get_mut(id)?;
        let ack = match cmd {
            VehicleCommand::Arm => {
                f_cont.arm();
                CommandAck::Armed
            }
            VehicleCommand::Disarm => {
                f_cont.disarm();
                CommandAck::Disarmed
            }
            VehicleCommand::Reset => {
                f_cont.reset();
                CommandAck::Reset
            }
            VehicleCommand::SetControls(controls) => {
                f_cont.set_controls(controls);
                CommandAck::ControlsSet
            }
            VehicleCommand::LogAnchor => CommandAck::AnchorLogged(f_cont.log_anchor()),
            VehicleCommand::ForceReturn => {
                f_cont.force_return();
                CommandAck::ReturnForced
            }
            VehicleCommand::AdjustJam(delta) => CommandAck::JamChanged(f_cont.adjust_jam(delta)),
        };
        Some(ack)
    }

    /// Read-only listing of every vehicle, sorted by id.
    pub async fn list_vehicles(&self) -> Vec<VehicleSnapshot> {
        let mut vehicles = self.collect_snapshots(&*self.fleet.lock().await);
        vehicles.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        vehicles
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            healthy: true,
            running: self.is_running(),
            vehicle_count: self.fleet.lock().await.len(),
            ticks: self.ticks.load(Ordering::Acquire),
            timestamp: Utc::now(),
        }
    }

    /// Executes one scheduler step: advances every vehicle by `dt` under the lock and,
    /// on every `broadcast_divisor`-th step, publishes a snapshot frame after the lock
    /// was released.
    ///
    /// # Returns
    /// The published frame, if this step produced one.
    pub async fn step(&self) -> Option<Arc<SnapshotFrame>> {
        let dt = self.config.dt();
        let divisor = u64::from(self.config.broadcast_divisor());
        let frame = {
            let mut fleet = self.fleet.lock().await;
            for f_cont in fleet.values_mut() {
                f_cont.advance(dt);
            }
            let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
            (tick % divisor == 0).then(|| SnapshotFrame {
                tick,
                timestamp: Utc::now(),
                vehicles: self.collect_snapshots(&fleet),
            })
        };
        frame.map(|f| {
            let shared = Arc::new(f);
            // no subscribers is not an error
            let _ = self.snapshot_tx.send(Arc::clone(&shared));
            shared
        })
    }

    /// Runs the fixed-rate tick loop until [`Supervisor::stop`] is called.
    ///
    /// Late ticks are delayed, not caught up, so the loop drifts under load.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.config.tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.running.store(true, Ordering::Release);
        log!("Simulation loop running at {} Hz.", self.config.tick_rate_hz());
        loop {
            tokio::select! {
                () = self.c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.step().await;
        }
        self.running.store(false, Ordering::Release);
        log!("Simulation loop stopped after {} ticks.", self.ticks.load(Ordering::Acquire));
    }

    /// Spawns the tick loop on first call, later calls do nothing.
    ///
    /// # Returns
    /// `true` if this call started the loop.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        let supervisor = Arc::clone(self);
        tokio::spawn(async move { supervisor.run().await });
        true
    }

    /// Stops the tick loop after its current step.
    pub fn stop(&self) { self.c_tok.cancel(); }

    pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

    fn collect_snapshots(&self, fleet: &HashMap<VehicleId, FlightComputer>) -> Vec<VehicleSnapshot> {
        let trail_len = self.config.snapshot_trail_len();
        fleet.values().map(|f_cont| f_cont.snapshot(trail_len)).collect()
    }

    #[cfg(test)]
    pub(crate) async fn with_vehicle<R>(&self, id: &VehicleId, f: impl FnOnce(&mut FlightComputer) -> R) -> Option<R> {
        self.fleet.lock().await.get_mut(id).map(f)
    }
}
