use super::aegis_messages::{self, DownstreamContent, UpstreamContent};
use super::console_endpoint::{ConnectionId, ConsoleEndpoint, ConsoleEvent};
use crate::flight_control::{
    CommandAck, DoctrineThresholds, Supervisor, VehicleCommand, VehicleId,
};
use crate::{event, info, warn};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

/// Bridges the console endpoint and the simulation scheduler.
///
/// Each console connection owns exactly one vehicle: it is registered on connect and
/// removed on disconnect. Commands are dispatched to the [`Supervisor`] and answered to
/// the sending connection only, snapshot frames are fanned out to every connection.
pub(crate) struct ConsoleMessenger {
    endpoint: Arc<ConsoleEndpoint>,
    c_tok: CancellationToken,
}

impl ConsoleMessenger {
    /// Starts the endpoint on `addr` together with the event and snapshot tasks.
    pub(crate) async fn start(
        addr: SocketAddr,
        supervisor: Arc<Supervisor>,
    ) -> Result<Self, std::io::Error> {
        let (endpoint, receiver) = ConsoleEndpoint::start(addr).await?;
        let endpoint = Arc::new(endpoint);
        let c_tok = CancellationToken::new();

        tokio::spawn(Self::run_events(
            Arc::clone(&endpoint),
            Arc::clone(&supervisor),
            receiver,
            c_tok.clone(),
        ));
        tokio::spawn(Self::run_snapshots(Arc::clone(&endpoint), supervisor, c_tok.clone()));

        Ok(Self { endpoint, c_tok })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr { self.endpoint.local_addr() }

    /// Stops both background tasks.
    pub(crate) fn stop(&self) { self.c_tok.cancel(); }

    async fn run_events(
        endpoint: Arc<ConsoleEndpoint>,
        supervisor: Arc<Supervisor>,
        mut receiver: mpsc::Receiver<ConsoleEvent>,
        c_tok: CancellationToken,
    ) {
        let mut owned: HashMap<ConnectionId, VehicleId> = HashMap::new();
        loop {
            let event = tokio::select! {
                () = c_tok.cancelled() => break,
                event = receiver.recv() => event,
            };
            let Some(event) = event else { break };
            match event {
                ConsoleEvent::Connected(conn) => {
                    let id = VehicleId::random();
                    let snapshot = supervisor.register(id.clone()).await;
                    owned.insert(conn, id.clone());
                    if supervisor.start() {
                        info!("Simulation started.");
                    }
                    endpoint.send_downstream(
                        DownstreamContent::DroneCreated(aegis_messages::DroneCreated {
                            vehicle_id: id.to_string(),
                            initial_state: Some((&snapshot).into()),
                            thresholds: Some(DoctrineThresholds::current().into()),
                        }),
                        Some(conn),
                    );
                }
                ConsoleEvent::Disconnected(conn) => {
                    if let Some(id) = owned.remove(&conn) {
                        supervisor.deregister(&id).await;
                    } else {
                        warn!("Console connection {conn} closed without a vehicle.");
                    }
                }
                ConsoleEvent::Message(conn, content) => {
                    if let Some(reply) = Self::handle_message(&supervisor, content).await {
                        endpoint.send_downstream(reply, Some(conn));
                    }
                }
            }
        }
    }

    /// Applies one upstream message.
    ///
    /// # Returns
    /// The reply for the sender, `None` if the message needs none or addressed an
    /// unknown vehicle.
    async fn handle_message(
        supervisor: &Supervisor,
        content: UpstreamContent,
    ) -> Option<DownstreamContent> {
        let (vehicle_id, cmd) = match content {
            UpstreamContent::Ping(ping) => {
                return Some(DownstreamContent::Pong(aegis_messages::Pong { echo: ping.echo }));
            }
            UpstreamContent::GetHealth(_) => {
                return Some(DownstreamContent::Health((&supervisor.health().await).into()));
            }
            UpstreamContent::ListVehicles(_) => {
                let vehicles = supervisor.list_vehicles().await.iter().map(Into::into).collect();
                return Some(DownstreamContent::VehicleList(aegis_messages::VehicleList { vehicles }));
            }
            UpstreamContent::Arm(r) => (r.vehicle_id, VehicleCommand::Arm),
            UpstreamContent::Disarm(r) => (r.vehicle_id, VehicleCommand::Disarm),
            UpstreamContent::Reset(r) => (r.vehicle_id, VehicleCommand::Reset),
            UpstreamContent::CommanderOverride(r) => (r.vehicle_id, VehicleCommand::ForceReturn),
            UpstreamContent::LogAnchor(r) => (r.vehicle_id, VehicleCommand::LogAnchor),
            UpstreamContent::SetControls(s) => {
                let cmd = VehicleCommand::SetControls((&s).into());
                (s.vehicle_id, cmd)
            }
            UpstreamContent::AdjustJam(j) => (j.vehicle_id, VehicleCommand::AdjustJam(j.delta)),
        };

        let id = VehicleId::from(vehicle_id);
        let Some(ack) = supervisor.dispatch(&id, cmd).await else {
            event!("Ignoring {cmd:?} for unknown vehicle '{id}'.");
            return None;
        };
        let status = |message: &str| {
            DownstreamContent::Status(aegis_messages::Status {
                vehicle_id: id.to_string(),
                message: message.to_string(),
            })
        };
        match ack {
            CommandAck::Armed => Some(status("Drone armed")),
            CommandAck::Disarmed => Some(status("Drone disarmed")),
            CommandAck::Reset => Some(status("Drone reset")),
            CommandAck::ReturnForced => Some(status("COMMANDER OVERRIDE: Forced RTB")),
            CommandAck::ControlsSet => None,
            CommandAck::JamChanged(level) => {
                Some(DownstreamContent::JamChanged(aegis_messages::JamChanged {
                    vehicle_id: id.to_string(),
                    level,
                }))
            }
            CommandAck::AnchorLogged(position) => {
                Some(DownstreamContent::AnchorLogged(aegis_messages::AnchorLogged {
                    vehicle_id: id.to_string(),
                    success: position.is_some(),
                    position: position.map(Into::into),
                }))
            }
        }
    }

    /// Forwards every published snapshot frame as one `DroneUpdate` per vehicle.
    async fn run_snapshots(
        endpoint: Arc<ConsoleEndpoint>,
        supervisor: Arc<Supervisor>,
        c_tok: CancellationToken,
    ) {
        let mut frames = supervisor.subscribe();
        drop(supervisor);
        loop {
            let frame = tokio::select! {
                () = c_tok.cancelled() => break,
                frame = frames.recv() => frame,
            };
            match frame {
                Ok(frame) => {
                    if !endpoint.is_console_connected() {
                        continue;
                    }
                    event!(
                        "Frame {} ({}) with {} vehicle(s) to console.",
                        frame.tick,
                        frame.timestamp.format("%H:%M:%S%.3f"),
                        frame.vehicles.len()
                    );
                    for vehicle in &frame.vehicles {
                        endpoint.send_downstream(DownstreamContent::DroneUpdate(vehicle.into()), None);
                    }
                }
                Err(RecvError::Lagged(skipped)) => event!("Snapshot fan-out skipped {skipped} frames."),
                Err(RecvError::Closed) => break,
            }
        }
    }
}
