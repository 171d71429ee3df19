use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::record::EventRecord;

/// Process-wide append-only event log.
///
/// The journal assigns sequence numbers in the exact order mutations
/// commit, so it must be appended to inside the same critical section as
/// the mutation it describes. It holds no lock of its own; the owning
/// transaction boundary provides exclusion.
#[derive(Debug)]
pub struct EventJournal<E> {
    records: Vec<EventRecord<E>>,
}

impl<E> Default for EventJournal<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<E: Event> EventJournal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record and return a copy of it.
    ///
    /// The assigned sequence number is `len() + 1`, keeping the journal
    /// dense from 1 with no gaps.
    pub fn append(&mut self, payload: E, at: DateTime<Utc>) -> EventRecord<E> {
        let record = EventRecord::new(self.records.len() as u64 + 1, at, payload);
        self.records.push(record.clone());
        record
    }

    /// All records with `sequence_number >= from`, oldest first.
    ///
    /// Replay never skips or reorders; calling it twice without an
    /// intervening append returns identical slices.
    pub fn replay_from(&self, from: u64) -> &[EventRecord<E>] {
        let start = (from.max(1) as usize - 1).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number of the newest record, or 0 for an empty journal.
    pub fn last_sequence(&self) -> u64 {
        self.records.len() as u64
    }
}
