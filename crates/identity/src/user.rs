//! User records, roles, and the status transition graph.

use serde::{Deserialize, Serialize};

use supplytrace_core::WalletAddress;

/// Supply-chain role of a participant. Fixed at creation, never changed.
///
/// Discriminants are part of the wire contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Manufacturer = 0,
    Warehouse = 1,
    Transporter = 2,
    Distributor = 3,
    Retailer = 4,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manufacturer => "Manufacturer",
            Role::Warehouse => "Warehouse",
            Role::Transporter => "Transporter",
            Role::Distributor => "Distributor",
            Role::Retailer => "Retailer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status of a participant.
///
/// Discriminants are part of the wire contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    /// Self-registered, awaiting administrator approval.
    Pending = 0,
    /// Registration denied. Terminal.
    Rejected = 1,
    /// Approved participant; may create batches and handle products.
    Active = 2,
    /// Locked out by an administrator. Terminal.
    Blocked = 3,
    /// Temporarily withdrawn; may be re-activated.
    Deactivated = 4,
}

impl UserStatus {
    /// Whether `self -> to` is an edge of the allowed transition graph.
    ///
    /// Blocked and Rejected have no outgoing edges: leaving either is a
    /// one-way lock-out policy, so re-activation attempts must fail.
    pub fn can_transition(self, to: UserStatus) -> bool {
        use UserStatus::*;
        matches!(
            (self, to),
            (Pending, Active) | (Pending, Rejected) | (Active, Blocked) | (Active, Deactivated) | (Deactivated, Active)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UserStatus::Blocked | UserStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "Pending",
            UserStatus::Rejected => "Rejected",
            UserStatus::Active => "Active",
            UserStatus::Blocked => "Blocked",
            UserStatus::Deactivated => "Deactivated",
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered supply-chain participant.
///
/// # Invariants
/// - `wallet` uniquely identifies at most one user and never changes.
/// - `role` is immutable once set.
/// - `status` only moves along the graph in [`UserStatus::can_transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub wallet: WalletAddress,
    pub name: String,
    pub place: String,
    pub role: Role,
    pub status: UserStatus,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}
