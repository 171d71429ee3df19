//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every variant carries the offending field or entity so a consumer can
/// render a specific message. Keep this focused on deterministic business
/// failures; there is no generic catch-all variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or out-of-range input. Recoverable by correcting the input.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Unique-key violation.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// A referenced entity is absent.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Actor not permitted: wrong role or inactive status.
    #[error("unauthorized for {wallet}: {reason}")]
    Unauthorized { wallet: String, reason: String },

    /// The requested state change is not allowed from the current state.
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The entity is already in a terminal state.
    #[error("{entity} is in terminal state {state}")]
    TerminalState { entity: &'static str, state: String },
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn unauthorized(wallet: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            wallet: wallet.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn terminal_state(entity: &'static str, state: impl Into<String>) -> Self {
        Self::TerminalState {
            entity,
            state: state.into(),
        }
    }
}
