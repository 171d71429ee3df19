use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use supplytrace_core::{BatchId, LedgerError, LedgerResult, WalletAddress};
use supplytrace_journal::Event;

/// A production batch. Immutable once created, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub description: String,
    /// Wallet of the Active user that created the batch. Attribution only;
    /// later status changes of the creator do not touch the batch.
    pub creator: WalletAddress,
}

/// Event emitted when a batch is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreated {
    pub batch: Batch,
}

/// All catalog events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    BatchCreated(BatchCreated),
}

impl Event for CatalogEvent {
    fn kind(&self) -> &'static str {
        match self {
            CatalogEvent::BatchCreated(_) => "catalog.batch.created",
        }
    }
}

/// Catalog of batches with dense ids assigned from 1.
///
/// Whether the creator is allowed to create batches is decided by the
/// transactional facade against the identity registry; the catalog only
/// validates its own fields.
#[derive(Debug, Default)]
pub struct BatchCatalog {
    batches: BTreeMap<BatchId, Batch>,
}

impl BatchCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> BatchId {
        self.batches
            .last_key_value()
            .map(|(id, _)| id.next())
            .unwrap_or(BatchId::FIRST)
    }

    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        creator: WalletAddress,
    ) -> LedgerResult<(Batch, CatalogEvent)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("name", "must not be empty"));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::validation("description", "must not be empty"));
        }

        let batch = Batch {
            id: self.next_id(),
            name: name.to_string(),
            description: description.to_string(),
            creator,
        };
        self.batches.insert(batch.id, batch.clone());

        let event = CatalogEvent::BatchCreated(BatchCreated {
            batch: batch.clone(),
        });
        Ok((batch, event))
    }

    pub fn get(&self, id: BatchId) -> LedgerResult<&Batch> {
        self.batches
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("batch", id.to_string()))
    }

    /// All batches in id order.
    pub fn list(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
