//! The ring itself: N slots, a parallel connection table, and the rotation
//! step.
//!
//! The ring is a plain data structure with no locking of its own — the
//! runtime wraps it in a single mutex and every caller (rotation, robot
//! reaction, coordinator reaction) performs its whole read-then-act sequence
//! under that one lock.

use serde::{Deserialize, Serialize};

use carousel_contracts::error::{CarouselError, CarouselResult};
use carousel_contracts::item::SlotContent;
use carousel_contracts::robot::AgentId;

/// Who a ring position is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Free,
    Coordinator,
    Robot(AgentId),
}

impl Occupant {
    pub fn is_free(self) -> bool {
        matches!(self, Occupant::Free)
    }
}

/// The circular production line.
///
/// Slot index 0 is the outlet (the coordinator injects raw components
/// there); index N-1 is the inlet (finished products are drained there).
/// Rotation shifts every item one position toward index 0, so material
/// injected at the outlet wraps to N-1 and then descends past the robot
/// positions before finished work reaches the inlet again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    slots: Vec<SlotContent>,
    connections: Vec<Occupant>,
}

impl Ring {
    /// Create an all-empty, all-unbound ring of `len` slots.
    pub fn new(len: usize) -> CarouselResult<Self> {
        if len < 4 {
            return Err(CarouselError::RingSetup {
                reason: format!("{len} slots cannot host inlet, outlet and a working area"),
            });
        }
        Ok(Self {
            slots: vec![SlotContent::Empty; len],
            connections: vec![Occupant::Free; len],
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Position where the coordinator injects components.
    pub fn outlet(&self) -> usize {
        0
    }

    /// Position where the coordinator drains finished products.
    pub fn inlet(&self) -> usize {
        self.slots.len() - 1
    }

    /// One rotation step: a single circular left shift. Slot `i` receives
    /// the former contents of slot `i+1`; slot `N-1` receives the former
    /// contents of slot 0. A pure permutation — no content is created,
    /// destroyed, or altered.
    pub fn rotate(&mut self) {
        self.slots.rotate_left(1);
    }

    pub fn slot(&self, position: usize) -> &SlotContent {
        &self.slots[position]
    }

    pub fn slot_mut(&mut self, position: usize) -> &mut SlotContent {
        &mut self.slots[position]
    }

    /// Number of empty slots; the coordinator's distribution throttle and
    /// the robots' stranded-component relief both read this.
    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_empty()).count()
    }

    pub fn occupant(&self, position: usize) -> Occupant {
        self.connections[position]
    }

    /// Bind a position. Binding over an existing binding is a logic error
    /// upstream, so it is reported rather than silently overwritten.
    pub fn bind(&mut self, position: usize, occupant: Occupant) -> CarouselResult<()> {
        if !self.connections[position].is_free() {
            return Err(CarouselError::RingSetup {
                reason: format!("position {position} is already bound"),
            });
        }
        self.connections[position] = occupant;
        Ok(())
    }

    /// Clear a binding. Unbinding a free position is harmless.
    pub fn unbind(&mut self, position: usize) {
        self.connections[position] = Occupant::Free;
    }

    /// Number of robots currently bound (coordinator excluded).
    pub fn robot_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| matches!(c, Occupant::Robot(_)))
            .count()
    }

    /// Iterate over `(position, occupant)` for every bound position.
    pub fn bindings(&self) -> impl Iterator<Item = (usize, Occupant)> + '_ {
        self.connections
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, occupant)| !occupant.is_free())
    }
}
