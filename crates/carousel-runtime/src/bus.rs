//! The tick bus: how the driver reaches every connected worker.
//!
//! Replaces the reference system's SIGUSR broadcasts with one unbounded
//! channel per subscriber. A broadcast enqueues one event per subscriber,
//! so a slow worker sees every tick in order and never observes two
//! rotations coalesced into one notification.

use std::collections::HashMap;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::trace;

use carousel_contracts::message::ControlEvent;
use carousel_contracts::robot::AgentId;

/// Identifies one subscriber on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberId {
    Coordinator,
    Robot(AgentId),
}

/// Per-worker event channels, keyed by subscriber identity.
///
/// The driver broadcasts after each committed rotation; the simulation
/// handle uses targeted sends for mode toggles and staged shutdown.
#[derive(Default)]
pub struct TickBus {
    subscribers: Mutex<HashMap<SubscriberId, Sender<ControlEvent>>>,
}

impl TickBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand back its event receiver.
    ///
    /// Re-subscribing replaces the previous channel; the stale receiver
    /// simply stops seeing events.
    pub fn subscribe(&self, id: SubscriberId) -> Receiver<ControlEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().insert(id, tx);
        rx
    }

    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.subscribers.lock().remove(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `event` to every current subscriber. Subscribers whose
    /// receiver has been dropped are pruned. Returns the delivery count.
    pub fn broadcast(&self, event: ControlEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        subscribers.retain(|id, tx| match tx.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                trace!(?id, "pruning dead subscriber");
                false
            }
        });
        delivered
    }

    /// Deliver `event` to one subscriber. Returns false if the subscriber
    /// is unknown or its receiver is gone.
    pub fn send_to(&self, id: &SubscriberId, event: ControlEvent) -> bool {
        let subscribers = self.subscribers.lock();
        match subscribers.get(id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_subscriber_in_order() {
        let bus = TickBus::new();
        let a = bus.subscribe(SubscriberId::Robot(AgentId(1)));
        let b = bus.subscribe(SubscriberId::Coordinator);

        for _ in 0..3 {
            assert_eq!(bus.broadcast(ControlEvent::Tick), 2);
        }
        bus.broadcast(ControlEvent::Shutdown);

        for rx in [a, b] {
            for _ in 0..3 {
                assert_eq!(rx.recv().unwrap(), ControlEvent::Tick);
            }
            assert_eq!(rx.recv().unwrap(), ControlEvent::Shutdown);
        }
    }

    #[test]
    fn one_event_per_rotation_no_coalescing() {
        let bus = TickBus::new();
        let rx = bus.subscribe(SubscriberId::Robot(AgentId(7)));
        for _ in 0..10 {
            bus.broadcast(ControlEvent::Tick);
        }
        // A subscriber that was slow to drain still sees all ten ticks.
        assert_eq!(rx.try_iter().count(), 10);
    }

    #[test]
    fn targeted_send_hits_only_its_subscriber() {
        let bus = TickBus::new();
        let a = bus.subscribe(SubscriberId::Robot(AgentId(1)));
        let b = bus.subscribe(SubscriberId::Robot(AgentId(2)));

        assert!(bus.send_to(&SubscriberId::Robot(AgentId(1)), ControlEvent::ToggleMode));
        assert_eq!(a.try_iter().count(), 1);
        assert_eq!(b.try_iter().count(), 0);

        assert!(!bus.send_to(&SubscriberId::Robot(AgentId(9)), ControlEvent::ToggleMode));
    }

    #[test]
    fn dropped_receivers_are_pruned_on_broadcast() {
        let bus = TickBus::new();
        let rx = bus.subscribe(SubscriberId::Robot(AgentId(1)));
        let _alive = bus.subscribe(SubscriberId::Robot(AgentId(2)));
        drop(rx);

        assert_eq!(bus.broadcast(ControlEvent::Tick), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn unsubscribe_removes_the_channel() {
        let bus = TickBus::new();
        bus.subscribe(SubscriberId::Coordinator);
        bus.unsubscribe(&SubscriberId::Coordinator);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.broadcast(ControlEvent::Tick), 0);
    }
}
