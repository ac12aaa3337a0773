//! Ledger notifications
//!
//! Every committed operation produces exactly one [`LedgerEvent`]. Events are
//! appended to an in-memory journal (the audit trail) and fanned out to live
//! subscribers over a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{AccountId, Amount, Bounty, Proposition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    BountyCreated {
        bounty: Bounty,
    },
    BountyFunded {
        id: String,
        value: Amount,
    },
    PropositionCreated {
        id: String,
        proposition: Proposition,
    },
    BountyResolved {
        id: String,
        solver: AccountId,
    },
    BountyClosed {
        id: String,
    },
}

impl LedgerEvent {
    pub fn bounty_id(&self) -> &str {
        match self {
            LedgerEvent::BountyCreated { bounty } => &bounty.id,
            LedgerEvent::BountyFunded { id, .. }
            | LedgerEvent::PropositionCreated { id, .. }
            | LedgerEvent::BountyResolved { id, .. }
            | LedgerEvent::BountyClosed { id } => id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::BountyCreated { .. } => "BountyCreated",
            LedgerEvent::BountyFunded { .. } => "BountyFunded",
            LedgerEvent::PropositionCreated { .. } => "PropositionCreated",
            LedgerEvent::BountyResolved { .. } => "BountyResolved",
            LedgerEvent::BountyClosed { .. } => "BountyClosed",
        }
    }
}

/// A committed event with its position in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

pub struct EventJournal {
    records: Vec<EventRecord>,
    keep_history: bool,
    next_seq: u64,
    sender: broadcast::Sender<EventRecord>,
}

impl EventJournal {
    pub fn new(keep_history: bool, channel_capacity: usize) -> Self {
        // broadcast::channel panics on a zero capacity
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            records: Vec::new(),
            keep_history,
            next_seq: 0,
            sender,
        }
    }

    /// Append a committed event and notify subscribers.
    pub fn publish(&mut self, event: LedgerEvent) -> EventRecord {
        let record = EventRecord {
            seq: self.next_seq,
            recorded_at: Utc::now(),
            event,
        };
        self.next_seq += 1;

        if self.keep_history {
            self.records.push(record.clone());
        }
        // No receivers is not an error for the ledger
        let _ = self.sender.send(record.clone());
        record
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }
}
