//! The production journal: an append-only, in-memory record of what the
//! line did, exportable after the run for reporting.
//!
//! Thread-safe by construction: the journal clones share one mutex-guarded
//! record list, so the coordinator worker and the simulation handle can
//! write and export concurrently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use carousel_contracts::item::ProductKind;
use carousel_contracts::robot::AgentId;

/// One noteworthy event on the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEvent {
    RobotJoined { id: AgentId, position: usize },
    RobotRejected { id: AgentId, reason: String },
    RobotLeft { id: AgentId },
    ComponentDistributed { kind: ProductKind },
    ProductDrained { kind: ProductKind },
    SimulationStopped { rotations: u64 },
}

/// An immutable journal entry. Sequence numbers are assigned on append and
/// are strictly increasing; entries are never modified or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: JournalEvent,
}

struct JournalState {
    records: Vec<JournalRecord>,
    next_sequence: u64,
}

/// Shared handle to the append-only journal.
#[derive(Clone)]
pub struct Journal {
    state: Arc<Mutex<JournalState>>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(JournalState {
                records: Vec::new(),
                next_sequence: 0,
            })),
        }
    }

    /// Append one event, stamping it with the next sequence number and the
    /// current wall-clock time.
    pub fn record(&self, event: JournalEvent) {
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.records.push(JournalRecord {
            sequence,
            timestamp: Utc::now(),
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records in append order.
    pub fn export(&self) -> Vec<JournalRecord> {
        self.state.lock().records.clone()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_strictly_increasing() {
        let journal = Journal::new();
        journal.record(JournalEvent::RobotJoined {
            id: AgentId(1),
            position: 2,
        });
        journal.record(JournalEvent::ComponentDistributed {
            kind: ProductKind(1),
        });
        journal.record(JournalEvent::ProductDrained {
            kind: ProductKind(1),
        });

        let records = journal.export();
        assert_eq!(records.len(), 3);
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, index as u64);
        }
    }

    #[test]
    fn clones_share_one_log() {
        let journal = Journal::new();
        let clone = journal.clone();
        clone.record(JournalEvent::RobotLeft { id: AgentId(3) });
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn records_serialize_for_export() {
        let journal = Journal::new();
        journal.record(JournalEvent::SimulationStopped { rotations: 42 });
        let json = serde_json::to_string(&journal.export()).unwrap();
        assert!(json.contains("SimulationStopped"));
        assert!(json.contains("42"));
    }

    #[test]
    fn concurrent_writers_never_collide_on_sequence() {
        let journal = Journal::new();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let journal = journal.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    journal.record(JournalEvent::ComponentDistributed {
                        kind: ProductKind(1),
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut sequences: Vec<u64> = journal.export().iter().map(|r| r.sequence).collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (0..200).collect::<Vec<u64>>());
    }
}
