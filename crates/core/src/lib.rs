//! Shared ledger primitives.
//!
//! This crate contains **pure domain** building blocks (identifiers and the
//! error model); no storage or transport concerns live here.

pub mod error;
pub mod id;

pub use error::{LedgerError, LedgerResult};
pub use id::{BatchId, ProductId, WalletAddress};
