//! Event types and broadcast bus
//!
//! Handlers emit [`CipaEvent`]s on state changes; SSE streams subscribe and
//! forward the ones their client cares about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{CandidateStatus, TermStatus};

/// CIPA event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CipaEvent {
    /// Candidacy created (in person or awaiting remote signature)
    CandidateRegistered {
        candidate_id: Uuid,
        term_id: Uuid,
        status: CandidateStatus,
        timestamp: DateTime<Utc>,
    },

    /// PENDING_SIGNATURE → APPROVED
    CandidateApproved {
        candidate_id: Uuid,
        term_id: Uuid,
        signature_url: String,
        timestamp: DateTime<Utc>,
    },

    /// Milestone completion toggled
    MilestoneUpdated {
        term_id: Uuid,
        milestone_id: String,
        completed: bool,
        percentage: u8,
        timestamp: DateTime<Utc>,
    },

    /// Term status changed through the guarded transition
    TermStatusChanged {
        term_id: Uuid,
        old_status: TermStatus,
        new_status: TermStatus,
        timestamp: DateTime<Utc>,
    },
}

impl CipaEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            CipaEvent::CandidateRegistered { .. } => "CandidateRegistered",
            CipaEvent::CandidateApproved { .. } => "CandidateApproved",
            CipaEvent::MilestoneUpdated { .. } => "MilestoneUpdated",
            CipaEvent::TermStatusChanged { .. } => "TermStatusChanged",
        }
    }

    /// Candidate the event concerns, if any
    pub fn candidate_id(&self) -> Option<Uuid> {
        match self {
            CipaEvent::CandidateRegistered { candidate_id, .. }
            | CipaEvent::CandidateApproved { candidate_id, .. } => Some(*candidate_id),
            _ => None,
        }
    }
}

/// Broadcast bus shared by handlers and SSE streams
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CipaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CipaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; returns the number of subscribers that received it
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CipaEvent) -> Result<usize, broadcast::error::SendError<CipaEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone listens
    pub fn emit_lossy(&self, event: CipaEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for event");
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let candidate_id = Uuid::new_v4();

        let delivered = bus
            .emit(CipaEvent::CandidateApproved {
                candidate_id,
                term_id: Uuid::new_v4(),
                signature_url: "/files/signatures/a.png".to_string(),
                timestamp: Utc::now(),
            })
            .unwrap();
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "CandidateApproved");
        assert_eq!(event.candidate_id(), Some(candidate_id));
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.capacity(), 4);
        let event = CipaEvent::MilestoneUpdated {
            term_id: Uuid::new_v4(),
            milestone_id: "convocation".to_string(),
            completed: true,
            percentage: 13,
            timestamp: Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = CipaEvent::TermStatusChanged {
            term_id: Uuid::new_v4(),
            old_status: TermStatus::Election,
            new_status: TermStatus::Active,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TermStatusChanged");
        assert_eq!(json["new_status"], "ACTIVE");
    }
}
