use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// One committed entry of the journal.
///
/// Notes:
/// - **Append-only**: `sequence_number` is dense and monotonically
///   increasing across the whole journal, starting at 1.
/// - Records are never edited or removed after commit.
/// - `timestamp` is the commit time, assigned by the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord<E> {
    record_id: Uuid,
    sequence_number: u64,
    kind: String,
    timestamp: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventRecord<E> {
    pub(crate) fn new(sequence_number: u64, timestamp: DateTime<Utc>, payload: E) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            sequence_number,
            kind: payload.kind().to_string(),
            timestamp,
            payload,
        }
    }
}

impl<E> EventRecord<E> {
    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
