//! Messages exchanged between the tick driver, the robots, and the
//! coordinator.
//!
//! These replace the reference system's signals and message queue: control
//! events flow over per-worker channels, admission requests over a single
//! many-producer channel into the coordinator.

use serde::{Deserialize, Serialize};

use crate::robot::{AgentId, RobotProfile};

/// A control event delivered to one worker's event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// One rotation has committed; re-evaluate the bound slot.
    /// Exactly one per rotation per subscriber, delivered after the
    /// rotation is fully visible.
    Tick,
    /// Flip the robot between normal and degraded mode.
    ToggleMode,
    /// Graceful shutdown: vacate the bound position and exit.
    Shutdown,
}

/// A request on the coordinator's admission channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionRequest {
    /// Ask for a ring position. The requester blocks on the reply.
    Join { profile: RobotProfile },
    /// Fire-and-forget departure notice; never acknowledged.
    Leave { id: AgentId },
}

/// The coordinator's reply to a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionReply {
    /// The index the robot is now bound to; the connection-table entry is
    /// already marked before this reply is sent.
    Assigned { position: usize },
    /// No unbound index remains.
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Operation, ProductKind};

    #[test]
    fn admission_request_round_trips_through_json() {
        let profile = RobotProfile::new(
            AgentId(3),
            vec![Operation('2')],
            vec![ProductKind(2)],
            vec![ProductKind(1), ProductKind(2)],
        )
        .unwrap();

        let original = AdmissionRequest::Join { profile };
        let json = serde_json::to_string(&original).unwrap();
        let decoded: AdmissionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn reply_variants_round_trip_through_json() {
        for original in [
            AdmissionReply::Assigned { position: 6 },
            AdmissionReply::Rejected {
                reason: "ring full".to_string(),
            },
        ] {
            let json = serde_json::to_string(&original).unwrap();
            let decoded: AdmissionReply = serde_json::from_str(&json).unwrap();
            assert_eq!(original, decoded);
        }
    }
}
