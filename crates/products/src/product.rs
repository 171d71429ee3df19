//! Product records, custody history, and the stage state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplytrace_core::{BatchId, LedgerError, LedgerResult, ProductId, WalletAddress};
use supplytrace_identity::Role;
use supplytrace_journal::Event;

use crate::stage::Stage;

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A tracked product.
///
/// # Invariants
/// - Ids are dense and monotonic, assigned exactly once.
/// - `stage` only moves to its immediate successor or to Lost.
/// - All fields except `stage` are immutable after creation.
/// - `manufactured_at < creation time < expires_at` is checked once at
///   creation and never re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub batch_id: BatchId,
    pub stage: Stage,
    pub product_type: String,
    pub description: String,
    pub manufactured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Price in the smallest currency unit.
    pub price: u64,
}

/// One custody interval of a product's history. Append-only.
///
/// The newest record with `exit_time == None` is the product's current
/// custody; it is closed in the same atomic step that opens the next one.
/// Old records never change except for that single close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub handler: WalletAddress,
    /// The handler's role when the record was opened; kept as a snapshot
    /// so history stays meaningful after later status changes.
    pub handler_role: Role,
    pub stage: Stage,
    /// Ordinal of this record within the product's history, from 1.
    pub visit: u32,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub remark: String,
}

impl StageRecord {
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when a product is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub product: Product,
}

/// Event emitted when a product moves to a new stage (including Lost).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStageUpdated {
    pub product_id: ProductId,
    pub old_stage: Stage,
    pub new_stage: Stage,
    pub handler: WalletAddress,
}

/// All product events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductAdded(ProductAdded),
    ProductStageUpdated(ProductStageUpdated),
}

impl Event for ProductEvent {
    fn kind(&self) -> &'static str {
        match self {
            ProductEvent::ProductAdded(_) => "products.product.added",
            ProductEvent::ProductStageUpdated(_) => "products.product.stage_updated",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Products plus their append-only custody histories.
///
/// The store enforces the stage machine and the record open/close
/// mechanics. Actor authorization (active status, role policy) and batch
/// existence are the transactional facade's responsibility; the store
/// trusts the `handler_role` snapshot it is given.
#[derive(Debug, Default)]
pub struct ProductStore {
    products: BTreeMap<ProductId, Product>,
    histories: BTreeMap<ProductId, Vec<StageRecord>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ProductId {
        self.products
            .last_key_value()
            .map(|(id, _)| id.next())
            .unwrap_or(ProductId::FIRST)
    }

    /// Create a product at stage Manufactured with its first open record.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        name: &str,
        product_type: &str,
        description: &str,
        batch_id: BatchId,
        manufactured_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        price: u64,
        creator: WalletAddress,
        creator_role: Role,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Product, ProductEvent)> {
        let name = required_field("name", name)?;
        let product_type = required_field("product_type", product_type)?;
        let description = required_field("description", description)?;

        if manufactured_at >= now {
            return Err(LedgerError::validation(
                "manufactured_at",
                "must be strictly in the past",
            ));
        }
        if expires_at <= manufactured_at {
            return Err(LedgerError::validation(
                "expires_at",
                "must be strictly after the manufacture date",
            ));
        }

        let product = Product {
            id: self.next_id(),
            name,
            batch_id,
            stage: Stage::Manufactured,
            product_type,
            description,
            manufactured_at,
            expires_at,
            price,
        };

        let first = StageRecord {
            handler: creator,
            handler_role: creator_role,
            stage: Stage::Manufactured,
            visit: 1,
            entry_time: now,
            exit_time: None,
            remark: "created".to_string(),
        };

        self.products.insert(product.id, product.clone());
        self.histories.insert(product.id, vec![first]);

        let event = ProductEvent::ProductAdded(ProductAdded {
            product: product.clone(),
        });
        Ok((product, event))
    }

    /// Advance a product to the immediate successor of its current stage.
    ///
    /// No skipping, no regression, and Lost is not reachable here.
    pub fn advance(
        &mut self,
        id: ProductId,
        new_stage: Stage,
        handler: WalletAddress,
        handler_role: Role,
        remark: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Product, ProductEvent)> {
        let remark = validate_remark(remark)?;
        let current = self.get(id)?.stage;

        if current.is_terminal() {
            return Err(LedgerError::terminal_state("product", current.as_str()));
        }
        if current.successor() != Some(new_stage) {
            return Err(LedgerError::invalid_transition(
                "product stage",
                current.as_str(),
                new_stage.as_str(),
            ));
        }

        self.transition(id, new_stage, handler, handler_role, remark, now)
    }

    /// Move a product to Lost from any non-terminal stage.
    pub fn mark_lost(
        &mut self,
        id: ProductId,
        handler: WalletAddress,
        handler_role: Role,
        remark: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Product, ProductEvent)> {
        let remark = validate_remark(remark)?;
        let current = self.get(id)?.stage;

        if current.is_terminal() {
            return Err(LedgerError::terminal_state("product", current.as_str()));
        }

        self.transition(id, Stage::Lost, handler, handler_role, remark, now)
    }

    /// Close the open record and open the next one, as one step.
    fn transition(
        &mut self,
        id: ProductId,
        new_stage: Stage,
        handler: WalletAddress,
        handler_role: Role,
        remark: String,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Product, ProductEvent)> {
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("product", id.to_string()))?;
        let old_stage = product.stage;
        product.stage = new_stage;
        let product = product.clone();

        let history = self.histories.entry(id).or_default();
        if let Some(open) = history.iter_mut().rev().find(|r| r.is_open()) {
            open.exit_time = Some(now);
        }

        let visit = history.len() as u32 + 1;
        history.push(StageRecord {
            handler: handler.clone(),
            handler_role,
            stage: new_stage,
            visit,
            entry_time: now,
            exit_time: None,
            remark,
        });

        let event = ProductEvent::ProductStageUpdated(ProductStageUpdated {
            product_id: id,
            old_stage,
            new_stage,
            handler,
        });
        Ok((product, event))
    }

    pub fn get(&self, id: ProductId) -> LedgerResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("product", id.to_string()))
    }

    /// Stage records oldest first. Finite and restartable.
    pub fn history(&self, id: ProductId) -> LedgerResult<&[StageRecord]> {
        self.get(id)?;
        Ok(self
            .histories
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Products for which the wallet owns at least one stage record, in id
    /// order.
    pub fn list_by_handler(&self, handler: &WalletAddress) -> Vec<&Product> {
        self.histories
            .iter()
            .filter(|(_, records)| records.iter().any(|r| &r.handler == handler))
            .filter_map(|(id, _)| self.products.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn required_field(field: &'static str, value: &str) -> LedgerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

fn validate_remark(remark: &str) -> LedgerResult<String> {
    let remark = remark.trim();
    if remark.chars().count() < 3 {
        return Err(LedgerError::validation(
            "remark",
            "must be at least 3 characters",
        ));
    }
    Ok(remark.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
