//! The concurrent runtime of the carousel line.
//!
//! One mutex-guarded ring, one tick driver, one coordinator worker, and a
//! thread per robot. Control flows over channels: per-worker event channels
//! carry ticks and shutdown, a shared admission channel carries join and
//! leave requests into the coordinator.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use carousel_ring::Ring;

pub mod bus;
pub mod driver;
pub mod journal;
pub mod sim;
pub mod workers;

pub use bus::{SubscriberId, TickBus};
pub use driver::TickDriver;
pub use journal::{Journal, JournalEvent, JournalRecord};
pub use sim::{Simulation, SimulationHandle, SimulationReport};
pub use workers::{spawn_coordinator, spawn_robot, AdmissionEnvelope, RobotHandle};

/// The one lock in the system. Rotation and every reaction to a tick run
/// their whole read-then-act sequence under it.
pub type SharedRing = Arc<Mutex<Ring>>;

/// Identifies one simulation run in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
