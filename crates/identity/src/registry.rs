//! Insertion-ordered registry of participants.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use supplytrace_core::{LedgerError, LedgerResult, WalletAddress};
use supplytrace_journal::Event;

use crate::user::{Role, User, UserStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when a user is registered or administratively added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAdded {
    pub user: User,
}

/// Event emitted when a user's status changes.
///
/// Carries both old and new status so subscribers can update their views
/// without re-querying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatusUpdated {
    pub wallet: WalletAddress,
    pub old_status: UserStatus,
    pub new_status: UserStatus,
}

/// All identity events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityEvent {
    UserAdded(UserAdded),
    UserStatusUpdated(UserStatusUpdated),
}

impl Event for IdentityEvent {
    fn kind(&self) -> &'static str {
        match self {
            IdentityEvent::UserAdded(_) => "identity.user.added",
            IdentityEvent::UserStatusUpdated(_) => "identity.user.status_updated",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of users, keyed by wallet, iterated in insertion order.
///
/// Users are never deleted. All checks run before any mutation, so a failed
/// call leaves the registry untouched. The registry itself is not
/// privileged-aware; the transactional facade decides who may call
/// [`IdentityRegistry::admin_add`] and [`IdentityRegistry::set_status`].
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    users: HashMap<WalletAddress, User>,
    order: Vec<WalletAddress>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Self-registration: the new user awaits administrator approval.
    pub fn register(
        &mut self,
        wallet: WalletAddress,
        name: &str,
        place: &str,
        role: Role,
    ) -> LedgerResult<(User, IdentityEvent)> {
        self.add(wallet, name, place, role, UserStatus::Pending)
    }

    /// Administrative creation: the user starts out pre-approved.
    pub fn admin_add(
        &mut self,
        wallet: WalletAddress,
        name: &str,
        place: &str,
        role: Role,
    ) -> LedgerResult<(User, IdentityEvent)> {
        self.add(wallet, name, place, role, UserStatus::Active)
    }

    fn add(
        &mut self,
        wallet: WalletAddress,
        name: &str,
        place: &str,
        role: Role,
        status: UserStatus,
    ) -> LedgerResult<(User, IdentityEvent)> {
        let name = validate_name(name)?;

        if self.users.contains_key(&wallet) {
            return Err(LedgerError::duplicate("user", wallet.to_string()));
        }

        let user = User {
            wallet: wallet.clone(),
            name,
            place: place.trim().to_string(),
            role,
            status,
        };

        self.order.push(wallet.clone());
        self.users.insert(wallet, user.clone());

        let event = IdentityEvent::UserAdded(UserAdded { user: user.clone() });
        Ok((user, event))
    }

    /// Move a user along the status graph.
    ///
    /// Returns the old and new status. Attempts to leave Blocked or
    /// Rejected, or to jump states, fail with `InvalidTransition` and leave
    /// the stored status unchanged.
    pub fn set_status(
        &mut self,
        wallet: &WalletAddress,
        new_status: UserStatus,
    ) -> LedgerResult<((UserStatus, UserStatus), IdentityEvent)> {
        let user = self
            .users
            .get_mut(wallet)
            .ok_or_else(|| LedgerError::not_found("user", wallet.to_string()))?;

        let old_status = user.status;
        if !old_status.can_transition(new_status) {
            return Err(LedgerError::invalid_transition(
                "user status",
                old_status.as_str(),
                new_status.as_str(),
            ));
        }

        user.status = new_status;

        let event = IdentityEvent::UserStatusUpdated(UserStatusUpdated {
            wallet: wallet.clone(),
            old_status,
            new_status,
        });
        Ok(((old_status, new_status), event))
    }

    pub fn get(&self, wallet: &WalletAddress) -> LedgerResult<&User> {
        self.users
            .get(wallet)
            .ok_or_else(|| LedgerError::not_found("user", wallet.to_string()))
    }

    /// Resolve a wallet to an Active user, for authorization checks.
    ///
    /// An unknown wallet is an authorization failure here, not a lookup
    /// failure: the caller is asserting the wallet may act.
    pub fn ensure_active(&self, wallet: &WalletAddress) -> LedgerResult<&User> {
        let user = self.users.get(wallet).ok_or_else(|| {
            LedgerError::unauthorized(wallet.to_string(), "wallet is not registered")
        })?;
        if !user.is_active() {
            return Err(LedgerError::unauthorized(
                wallet.to_string(),
                format!("user status is {}", user.status),
            ));
        }
        Ok(user)
    }

    /// All users in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &User> {
        self.order.iter().filter_map(|w| self.users.get(w))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn validate_name(name: &str) -> LedgerResult<String> {
    let name = name.trim();
    if name.chars().count() <= 5 {
        return Err(LedgerError::validation(
            "name",
            "must be longer than 5 characters",
        ));
    }
    Ok(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
