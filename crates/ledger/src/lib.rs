//! Transactional facade over the supply-chain ledger.
//!
//! Composes the identity registry, batch catalog, product store, and event
//! journal behind one write boundary: every mutating command validates,
//! mutates, and journals as a single non-interleaved transaction, then
//! publishes the committed record to feed subscribers.

pub mod event;
pub mod ledger;

#[cfg(test)]
mod integration_tests;

pub use event::LedgerEvent;
pub use ledger::{Ledger, ProductDetails};

pub use supplytrace_catalog::{Batch, BatchCreated};
pub use supplytrace_core::{BatchId, LedgerError, LedgerResult, ProductId, WalletAddress};
pub use supplytrace_identity::{Role, User, UserAdded, UserStatus, UserStatusUpdated};
pub use supplytrace_journal::{EventRecord, Subscription};
pub use supplytrace_products::{
    Product, ProductAdded, ProductStageUpdated, Stage, StagePolicy, StageRecord,
};
