//! The ledger facade: command/query API plus the transactional boundary.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplytrace_catalog::{Batch, BatchCatalog};
use supplytrace_core::{BatchId, LedgerError, LedgerResult, ProductId, WalletAddress};
use supplytrace_identity::{IdentityRegistry, Role, User, UserStatus};
use supplytrace_journal::{EventBus, EventJournal, EventRecord, InMemoryEventBus, Subscription};
use supplytrace_products::{Product, ProductStore, Stage, StagePolicy, StageRecord};

use crate::event::LedgerEvent;

/// Everything a subscriber or caller needs to render one product: the
/// product, its batch, and the full custody history oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product: Product,
    pub batch: Batch,
    pub history: Vec<StageRecord>,
}

#[derive(Debug, Default)]
struct LedgerState {
    identity: IdentityRegistry,
    catalog: BatchCatalog,
    products: ProductStore,
    journal: EventJournal<LedgerEvent>,
}

/// The authoritative ledger of users, batches, products, and their audit
/// trail.
///
/// All mutating commands run as whole transactions under one write lock:
/// validation, mutation, and the journal append are not interleaved with
/// any other command, and a failed command has no partial effect.
/// Concurrent mutations on the same entity serialize; the loser's
/// preconditions re-evaluate against the winner's post-state, so a racing
/// command can legitimately fail with `InvalidTransition`.
///
/// Reads run in parallel under the read lock against a consistent
/// snapshot. Feed publication happens after the lock is released and
/// never affects commit success.
#[derive(Debug)]
pub struct Ledger {
    admin: WalletAddress,
    policy: StagePolicy,
    state: RwLock<LedgerState>,
    bus: Arc<InMemoryEventBus<EventRecord<LedgerEvent>>>,
}

impl Ledger {
    /// A fresh ledger whose privileged operations are restricted to
    /// `admin`, using the default role-to-stage policy.
    pub fn new(admin: WalletAddress) -> Self {
        Self::with_policy(admin, StagePolicy::default())
    }

    pub fn with_policy(admin: WalletAddress, policy: StagePolicy) -> Self {
        Self {
            admin,
            policy,
            state: RwLock::new(LedgerState::default()),
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    pub fn admin(&self) -> &WalletAddress {
        &self.admin
    }

    // Every mutation is check-then-apply, so the state behind a poisoned
    // lock is still consistent; recover the guard rather than failing
    // every later call.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_admin(&self, caller: &WalletAddress) -> LedgerResult<()> {
        if caller != &self.admin {
            return Err(LedgerError::unauthorized(
                caller.to_string(),
                "caller is not the registry administrator",
            ));
        }
        Ok(())
    }

    /// Publish a committed record to feed subscribers. The record is
    /// already journaled; delivery failure must not affect the commit.
    fn publish(&self, record: EventRecord<LedgerEvent>) {
        if let Err(e) = self.bus.publish(record) {
            tracing::warn!("event feed publish failed: {e:?}");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Identity commands
    // ─────────────────────────────────────────────────────────────────────

    /// Self-registration. The wallet is the caller's authenticated
    /// identity; the new user awaits approval (status Pending).
    pub fn register_user(
        &self,
        caller: &WalletAddress,
        name: &str,
        place: &str,
        role: Role,
    ) -> LedgerResult<User> {
        let now = Utc::now();
        let record;
        let user;
        {
            let mut state = self.write();
            let (created, event) = state.identity.register(caller.clone(), name, place, role)?;
            record = state.journal.append(event.into(), now);
            user = created;
        }
        tracing::info!("user registered: {} ({})", user.wallet, user.role);
        self.publish(record);
        Ok(user)
    }

    /// Administrative creation: the user starts out Active. Privileged.
    pub fn admin_add_user(
        &self,
        caller: &WalletAddress,
        wallet: WalletAddress,
        name: &str,
        place: &str,
        role: Role,
    ) -> LedgerResult<User> {
        self.ensure_admin(caller)?;

        let now = Utc::now();
        let record;
        let user;
        {
            let mut state = self.write();
            let (created, event) = state.identity.admin_add(wallet, name, place, role)?;
            record = state.journal.append(event.into(), now);
            user = created;
        }
        tracing::info!("user added by admin: {} ({})", user.wallet, user.role);
        self.publish(record);
        Ok(user)
    }

    /// Move a user along the status graph. Privileged.
    pub fn set_user_status(
        &self,
        caller: &WalletAddress,
        wallet: &WalletAddress,
        new_status: UserStatus,
    ) -> LedgerResult<(UserStatus, UserStatus)> {
        self.ensure_admin(caller)?;

        let now = Utc::now();
        let record;
        let statuses;
        {
            let mut state = self.write();
            let (changed, event) = state.identity.set_status(wallet, new_status)?;
            record = state.journal.append(event.into(), now);
            statuses = changed;
        }
        tracing::info!(
            "user status updated: {} {} -> {}",
            wallet,
            statuses.0,
            statuses.1
        );
        self.publish(record);
        Ok(statuses)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog commands
    // ─────────────────────────────────────────────────────────────────────

    /// Create a batch. The caller must be an Active user.
    pub fn create_batch(
        &self,
        caller: &WalletAddress,
        name: &str,
        description: &str,
    ) -> LedgerResult<Batch> {
        let now = Utc::now();
        let record;
        let batch;
        {
            let mut state = self.write();
            state.identity.ensure_active(caller)?;
            let (created, event) = state.catalog.create(name, description, caller.clone())?;
            record = state.journal.append(event.into(), now);
            batch = created;
        }
        tracing::info!("batch created: {} ({})", batch.id, batch.name);
        self.publish(record);
        Ok(batch)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Product commands
    // ─────────────────────────────────────────────────────────────────────

    /// Create a product in an existing batch. Creation is open to any
    /// Active participant acting as originator; role is unrestricted at
    /// this step.
    #[allow(clippy::too_many_arguments)]
    pub fn add_product(
        &self,
        caller: &WalletAddress,
        name: &str,
        product_type: &str,
        description: &str,
        batch_id: BatchId,
        manufactured_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        price: u64,
    ) -> LedgerResult<Product> {
        let now = Utc::now();
        let record;
        let product;
        {
            let mut state = self.write();
            let creator_role = state.identity.ensure_active(caller)?.role;
            state.catalog.get(batch_id)?;
            let (created, event) = state.products.add(
                name,
                product_type,
                description,
                batch_id,
                manufactured_at,
                expires_at,
                price,
                caller.clone(),
                creator_role,
                now,
            )?;
            record = state.journal.append(event.into(), now);
            product = created;
        }
        tracing::info!("product added: {} ({})", product.id, product.name);
        self.publish(record);
        Ok(product)
    }

    /// Advance a product to the immediate successor of its current stage.
    /// The handler must be Active and hold the role the policy requires
    /// for the stage being entered.
    pub fn advance_stage(
        &self,
        caller: &WalletAddress,
        product_id: ProductId,
        new_stage: Stage,
        remark: &str,
    ) -> LedgerResult<Product> {
        let now = Utc::now();
        let record;
        let product;
        {
            let mut state = self.write();
            let handler_role = state.identity.ensure_active(caller)?.role;
            if !self.policy.allows(new_stage, handler_role) {
                return Err(LedgerError::unauthorized(
                    caller.to_string(),
                    format!("role {handler_role} may not record stage {new_stage}"),
                ));
            }
            let (updated, event) = state.products.advance(
                product_id,
                new_stage,
                caller.clone(),
                handler_role,
                remark,
                now,
            )?;
            record = state.journal.append(event.into(), now);
            product = updated;
        }
        tracing::info!("product {} moved to {}", product.id, product.stage);
        self.publish(record);
        Ok(product)
    }

    /// Report a product lost from any non-terminal stage.
    pub fn mark_lost(
        &self,
        caller: &WalletAddress,
        product_id: ProductId,
        remark: &str,
    ) -> LedgerResult<Product> {
        let now = Utc::now();
        let record;
        let product;
        {
            let mut state = self.write();
            let handler_role = state.identity.ensure_active(caller)?.role;
            if !self.policy.allows(Stage::Lost, handler_role) {
                return Err(LedgerError::unauthorized(
                    caller.to_string(),
                    format!("role {handler_role} may not record stage {}", Stage::Lost),
                ));
            }
            let (updated, event) =
                state
                    .products
                    .mark_lost(product_id, caller.clone(), handler_role, remark, now)?;
            record = state.journal.append(event.into(), now);
            product = updated;
        }
        tracing::info!("product {} marked lost", product.id);
        self.publish(record);
        Ok(product)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_user(&self, wallet: &WalletAddress) -> LedgerResult<User> {
        self.read().identity.get(wallet).cloned()
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> Vec<User> {
        self.read().identity.list().cloned().collect()
    }

    pub fn get_batch(&self, id: BatchId) -> LedgerResult<Batch> {
        self.read().catalog.get(id).cloned()
    }

    /// All batches in id order.
    pub fn list_batches(&self) -> Vec<Batch> {
        self.read().catalog.list().cloned().collect()
    }

    /// Product, batch, and custody history (oldest first) in one
    /// consistent snapshot.
    pub fn get_details(&self, product_id: ProductId) -> LedgerResult<ProductDetails> {
        let state = self.read();
        let product = state.products.get(product_id)?.clone();
        let batch = state.catalog.get(product.batch_id)?.clone();
        let history = state.products.history(product_id)?.to_vec();
        Ok(ProductDetails {
            product,
            batch,
            history,
        })
    }

    /// Products for which the wallet owns at least one stage record.
    pub fn list_by_handler(&self, wallet: &WalletAddress) -> Vec<Product> {
        self.read()
            .products
            .list_by_handler(wallet)
            .into_iter()
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Event feed
    // ─────────────────────────────────────────────────────────────────────

    /// Replay the journal from a sequence number (records with
    /// `sequence_number >= from`, oldest first).
    pub fn replay_from(&self, from: u64) -> Vec<EventRecord<LedgerEvent>> {
        self.read().journal.replay_from(from).to_vec()
    }

    /// Sequence number of the newest journal record, 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.read().journal.last_sequence()
    }

    /// Subscribe to records committed after this call. Use
    /// [`Ledger::replay_from`] first to catch up on history.
    pub fn subscribe(&self) -> Subscription<EventRecord<LedgerEvent>> {
        self.bus.subscribe()
    }
}
