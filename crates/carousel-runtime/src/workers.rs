//! Worker threads: one per robot, one for the coordinator.
//!
//! Admission replaces the reference system's message queue: a robot sends a
//! join request carrying a one-shot reply channel, and the coordinator binds
//! the assigned position in the connection table before the reply leaves.
//! By the time a robot learns its position, no other joiner can be told the
//! same one.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, never, select, Receiver, Sender};
use tracing::{debug, info, warn};

use carousel_contracts::error::{CarouselError, CarouselResult};
use carousel_contracts::message::{AdmissionReply, AdmissionRequest, ControlEvent};
use carousel_contracts::recipe::RecipeCatalog;
use carousel_contracts::robot::{AgentId, RobotProfile};
use carousel_core::{Coordinator, ProductionSummary, Robot};
use carousel_ring::{assign_position, Occupant};

use crate::bus::{SubscriberId, TickBus};
use crate::journal::{Journal, JournalEvent};
use crate::SharedRing;

/// One admission-channel message: the request plus, for joins, the channel
/// the coordinator answers on.
pub struct AdmissionEnvelope {
    pub request: AdmissionRequest,
    pub reply: Option<Sender<AdmissionReply>>,
}

/// A running robot worker.
#[derive(Debug)]
pub struct RobotHandle {
    pub id: AgentId,
    pub position: usize,
    pub thread: JoinHandle<()>,
}

/// Join the line and start a robot worker.
///
/// Blocks until the coordinator answers the join request; the worker is
/// spawned only once a position is assigned, so a rejected robot never
/// subscribes to the bus or touches the ring.
pub fn spawn_robot(
    profile: RobotProfile,
    ring: SharedRing,
    bus: Arc<TickBus>,
    admission_tx: Sender<AdmissionEnvelope>,
    catalog: Arc<RecipeCatalog>,
) -> CarouselResult<RobotHandle> {
    let id = profile.id;
    let (reply_tx, reply_rx) = bounded(1);
    admission_tx
        .send(AdmissionEnvelope {
            request: AdmissionRequest::Join {
                profile: profile.clone(),
            },
            reply: Some(reply_tx),
        })
        .map_err(|_| CarouselError::ChannelClosed {
            endpoint: "admission".to_string(),
        })?;

    let position = match reply_rx.recv() {
        Ok(AdmissionReply::Assigned { position }) => position,
        Ok(AdmissionReply::Rejected { reason }) => {
            return Err(CarouselError::AdmissionRejected { reason });
        }
        Err(_) => {
            return Err(CarouselError::ChannelClosed {
                endpoint: "admission reply".to_string(),
            });
        }
    };

    // Subscribe before the thread starts so no tick can slip past between
    // admission and the first recv.
    let events = bus.subscribe(SubscriberId::Robot(id));
    let mut robot = Robot::new(profile, position, catalog);
    info!(robot = %id, position, "robot joined the line");

    let thread = std::thread::spawn(move || {
        robot_loop(&mut robot, &events, &ring);
        // Departure: tell the coordinator, vacate the position, leave the bus.
        let _ = admission_tx.send(AdmissionEnvelope {
            request: AdmissionRequest::Leave { id },
            reply: None,
        });
        ring.lock().unbind(position);
        bus.unsubscribe(&SubscriberId::Robot(id));
        info!(robot = %id, position, "robot left the line");
    });

    Ok(RobotHandle {
        id,
        position,
        thread,
    })
}

fn robot_loop(robot: &mut Robot, events: &Receiver<ControlEvent>, ring: &SharedRing) {
    loop {
        match events.recv() {
            Ok(ControlEvent::Tick) => {
                let mut ring = ring.lock();
                robot.on_tick(&mut ring);
            }
            Ok(ControlEvent::ToggleMode) => robot.toggle_mode(),
            Ok(ControlEvent::Shutdown) => break,
            Err(_) => {
                warn!(robot = %robot.id(), "event channel closed without shutdown");
                break;
            }
        }
    }
}

/// Start the coordinator worker.
///
/// The coordinator multiplexes the tick channel and the admission channel;
/// ticks drain and distribute, admissions mutate the connection table. On
/// shutdown it vacates the inlet and outlet and reports the final summary.
pub fn spawn_coordinator(
    mut coordinator: Coordinator,
    ring: SharedRing,
    bus: Arc<TickBus>,
    admission_rx: Receiver<AdmissionEnvelope>,
    max_robots: usize,
    journal: Journal,
    summary_tx: Sender<ProductionSummary>,
) -> JoinHandle<()> {
    let events = bus.subscribe(SubscriberId::Coordinator);

    std::thread::spawn(move || {
        let mut admission_rx = admission_rx;
        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(ControlEvent::Tick) => {
                        let outcome = {
                            let mut ring = ring.lock();
                            coordinator.on_tick(&mut ring)
                        };
                        if let Some(kind) = outcome.drained {
                            journal.record(JournalEvent::ProductDrained { kind });
                        }
                        if let Some(kind) = outcome.distributed {
                            journal.record(JournalEvent::ComponentDistributed { kind });
                        }
                    }
                    Ok(ControlEvent::ToggleMode) => {}
                    Ok(ControlEvent::Shutdown) | Err(_) => break,
                },
                recv(admission_rx) -> envelope => match envelope {
                    Ok(envelope) => {
                        handle_admission(envelope, &ring, max_robots, &journal);
                    }
                    Err(_) => {
                        // All requesters gone; stop polling the dead channel.
                        admission_rx = never();
                    }
                },
            }
        }

        {
            let mut ring = ring.lock();
            let inlet = ring.inlet();
            let outlet = ring.outlet();
            ring.unbind(inlet);
            ring.unbind(outlet);
        }
        bus.unsubscribe(&SubscriberId::Coordinator);
        let _ = summary_tx.send(coordinator.summary());
        info!("coordinator stopped");
    })
}

fn handle_admission(
    envelope: AdmissionEnvelope,
    ring: &SharedRing,
    max_robots: usize,
    journal: &Journal,
) {
    match envelope.request {
        AdmissionRequest::Join { profile } => {
            let id = profile.id;
            let reply = {
                let mut ring = ring.lock();
                match assign_position(&ring, max_robots) {
                    Some(position) => {
                        // Bind before replying; the reply only ever names a
                        // position already marked as taken.
                        match ring.bind(position, Occupant::Robot(id)) {
                            Ok(()) => {
                                journal.record(JournalEvent::RobotJoined { id, position });
                                AdmissionReply::Assigned { position }
                            }
                            Err(e) => AdmissionReply::Rejected {
                                reason: e.to_string(),
                            },
                        }
                    }
                    None => {
                        let reason = "no unbound position on the ring".to_string();
                        journal.record(JournalEvent::RobotRejected {
                            id,
                            reason: reason.clone(),
                        });
                        warn!(robot = %id, "admission rejected");
                        AdmissionReply::Rejected { reason }
                    }
                }
            };
            if let Some(tx) = envelope.reply {
                let _ = tx.send(reply);
            }
        }
        AdmissionRequest::Leave { id } => {
            debug!(robot = %id, "departure notice");
            journal.record(JournalEvent::RobotLeft { id });
        }
    }
}
