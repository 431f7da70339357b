use super::SimConfig;
use crate::console_communication::ConsoleMessenger;
use crate::flight_control::Supervisor;
use crate::info;
use std::sync::Arc;

/// Struct holding the key components of the simulator for the lifetime of `main`.
///
/// # Fields
/// - `supervisor`: The scheduler owning and ticking all vehicles.
/// - `con`: The console messenger connecting operators to their vehicles.
pub struct Keychain {
    /// The simulation scheduler.
    supervisor: Arc<Supervisor>,
    /// The console messenger handling operator connections.
    con: Arc<ConsoleMessenger>,
}

impl Keychain {
    /// Creates the scheduler and starts the console on the configured address.
    ///
    /// The tick loop itself is started lazily by the first console connection.
    ///
    /// # Returns
    /// The keychain, or the I/O error from binding the console listener.
    pub async fn new(config: SimConfig) -> Result<Self, std::io::Error> {
        let supervisor = Arc::new(Supervisor::new(config.scheduler()));
        let con = Arc::new(ConsoleMessenger::start(config.bind_addr(), Arc::clone(&supervisor)).await?);
        info!("Console listening on {}.", con.local_addr());
        Ok(Self { supervisor, con })
    }

    /// Stops the console tasks and the tick loop.
    pub fn shutdown(&self) {
        self.con.stop();
        self.supervisor.stop();
    }
}
