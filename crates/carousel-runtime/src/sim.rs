//! Assembling and tearing down a whole simulation run.
//!
//! `Simulation::start` turns a validated scenario into a running line: the
//! shared ring, the coordinator worker, the robot fleet, and finally the
//! tick driver. Startup is strictly ordered — the coordinator is listening
//! before the first robot asks to join, and the driver only starts once the
//! fleet is in place, so no rotation happens during admission.
//!
//! Shutdown is staged the other way around: stop the clock, retire the
//! robots, then retire the coordinator and collect its final summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{info, warn};

use carousel_contracts::config::ScenarioConfig;
use carousel_contracts::error::{CarouselError, CarouselResult};
use carousel_contracts::message::ControlEvent;
use carousel_contracts::robot::AgentId;
use carousel_core::{Coordinator, ProductionSummary};
use carousel_ring::{Occupant, Ring};

use crate::bus::{SubscriberId, TickBus};
use crate::driver::TickDriver;
use crate::journal::{Journal, JournalEvent, JournalRecord};
use crate::workers::{spawn_coordinator, spawn_robot, AdmissionEnvelope, RobotHandle};
use crate::{RunId, SharedRing};

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct SimulationReport {
    pub run_id: RunId,
    pub rotations: u64,
    pub summary: ProductionSummary,
    pub journal: Vec<JournalRecord>,
}

pub struct Simulation;

impl Simulation {
    /// Bring up a full line from a scenario.
    ///
    /// With `rotation_budget = Some(n)` the driver stops by itself after
    /// `n` rotations and `wait` returns; with `None` the run continues
    /// until `shutdown` is called.
    pub fn start(
        config: &ScenarioConfig,
        rotation_budget: Option<u64>,
    ) -> CarouselResult<SimulationHandle> {
        config.validate()?;
        let catalog = Arc::new(config.catalog()?);
        let sim = &config.simulation;

        let mut ring = Ring::new(sim.ring_slots)?;
        let inlet = ring.inlet();
        let outlet = ring.outlet();
        ring.bind(inlet, Occupant::Coordinator)?;
        ring.bind(outlet, Occupant::Coordinator)?;
        let ring: SharedRing = Arc::new(Mutex::new(ring));

        let run_id = RunId::new();
        let bus = Arc::new(TickBus::new());
        let stop = Arc::new(AtomicBool::new(false));
        let journal = Journal::new();
        let (admission_tx, admission_rx) = unbounded();
        let (summary_tx, summary_rx) = bounded(1);

        info!(%run_id, slots = sim.ring_slots, cadence_ms = sim.cadence_ms, "starting simulation");

        let coordinator = Coordinator::new(
            catalog.clone(),
            config.planned_units(),
            sim.empty_slack,
        )?;
        let coordinator = spawn_coordinator(
            coordinator,
            ring.clone(),
            bus.clone(),
            admission_rx,
            sim.max_robots,
            journal.clone(),
            summary_tx,
        );

        let mut robots = Vec::new();
        for profile in config.robot_profiles()? {
            let id = profile.id;
            match spawn_robot(
                profile,
                ring.clone(),
                bus.clone(),
                admission_tx.clone(),
                catalog.clone(),
            ) {
                Ok(handle) => robots.push(handle),
                // A full ring is a scenario property, not a startup failure:
                // the line runs with the robots that did fit.
                Err(CarouselError::AdmissionRejected { reason }) => {
                    warn!(robot = %id, reason, "robot not admitted, continuing without it");
                }
                Err(e) => return Err(e),
            }
        }

        let driver = TickDriver::new(
            ring.clone(),
            bus.clone(),
            Duration::from_millis(sim.cadence_ms),
            rotation_budget,
            stop.clone(),
        )
        .spawn();

        Ok(SimulationHandle {
            run_id,
            ring,
            bus,
            stop,
            driver,
            robots,
            coordinator,
            admission_tx,
            summary_rx,
            journal,
        })
    }
}

/// A running simulation. Consumed by `wait` or `shutdown`, both of which
/// perform the staged teardown and return the final report.
pub struct SimulationHandle {
    run_id: RunId,
    ring: SharedRing,
    bus: Arc<TickBus>,
    stop: Arc<AtomicBool>,
    driver: JoinHandle<u64>,
    robots: Vec<RobotHandle>,
    coordinator: JoinHandle<()>,
    // Kept alive so the coordinator's admission receiver stays open for the
    // robots' departure notices during teardown.
    admission_tx: Sender<AdmissionEnvelope>,
    summary_rx: Receiver<ProductionSummary>,
    journal: Journal,
}

impl SimulationHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn ring(&self) -> &SharedRing {
        &self.ring
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Robots admitted at startup, in configuration order.
    pub fn robots(&self) -> &[RobotHandle] {
        &self.robots
    }

    /// Flip one robot between normal and degraded mode. Returns false when
    /// no such robot is connected.
    pub fn toggle_mode(&self, id: AgentId) -> bool {
        self.bus
            .send_to(&SubscriberId::Robot(id), ControlEvent::ToggleMode)
    }

    /// Block until the driver's rotation budget is exhausted, then tear the
    /// line down. Only meaningful for budgeted runs; an unbudgeted driver
    /// never stops on its own.
    pub fn wait(self) -> CarouselResult<SimulationReport> {
        self.finish(false)
    }

    /// Stop the line now: halt the clock, then tear down.
    pub fn shutdown(self) -> CarouselResult<SimulationReport> {
        self.finish(true)
    }

    /// The staged teardown: stop and join the clock, retire the robots,
    /// retire the coordinator last so every departure notice still has a
    /// listener.
    fn finish(self, stop_now: bool) -> CarouselResult<SimulationReport> {
        if stop_now {
            self.stop.store(true, Ordering::SeqCst);
        }
        let rotations = self
            .driver
            .join()
            .map_err(|_| CarouselError::WorkerPanicked {
                name: "tick driver".to_string(),
            })?;

        for handle in &self.robots {
            self.bus
                .send_to(&SubscriberId::Robot(handle.id), ControlEvent::Shutdown);
        }
        for handle in self.robots {
            let id = handle.id;
            handle
                .thread
                .join()
                .map_err(|_| CarouselError::WorkerPanicked {
                    name: format!("robot {id}"),
                })?;
        }

        self.bus
            .send_to(&SubscriberId::Coordinator, ControlEvent::Shutdown);
        self.coordinator
            .join()
            .map_err(|_| CarouselError::WorkerPanicked {
                name: "coordinator".to_string(),
            })?;
        drop(self.admission_tx);

        let summary = self
            .summary_rx
            .recv()
            .map_err(|_| CarouselError::ChannelClosed {
                endpoint: "final summary".to_string(),
            })?;

        self.journal
            .record(JournalEvent::SimulationStopped { rotations });
        info!(run_id = %self.run_id, rotations, "simulation stopped");

        Ok(SimulationReport {
            run_id: self.run_id,
            rotations,
            summary,
            journal: self.journal.export(),
        })
    }
}
