//! Lifecycle stages and the role-to-stage authorization policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use supplytrace_identity::Role;

/// Position of a product in its physical lifecycle.
///
/// The order is total with one branch: each stage advances only to its
/// immediate successor, and Lost is reachable from any non-terminal stage.
/// Discriminants are part of the wire contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Manufactured = 0,
    Warehoused = 1,
    Dispatched = 2,
    Distributor = 3,
    Retailer = 4,
    Sold = 5,
    Lost = 6,
}

impl Stage {
    /// The unique next stage in the fixed order, if any.
    ///
    /// Lost is never a successor; it is only reachable through the
    /// explicit mark-lost operation.
    pub fn successor(self) -> Option<Stage> {
        match self {
            Stage::Manufactured => Some(Stage::Warehoused),
            Stage::Warehoused => Some(Stage::Dispatched),
            Stage::Dispatched => Some(Stage::Distributor),
            Stage::Distributor => Some(Stage::Retailer),
            Stage::Retailer => Some(Stage::Sold),
            Stage::Sold | Stage::Lost => None,
        }
    }

    /// Sold and Lost have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Sold | Stage::Lost)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Manufactured => "Manufactured",
            Stage::Warehoused => "Warehoused",
            Stage::Dispatched => "Dispatched",
            Stage::Distributor => "Distributor",
            Stage::Retailer => "Retailer",
            Stage::Sold => "Sold",
            Stage::Lost => "Lost",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which role may record entry into each stage.
///
/// The mapping is data, not code: it can be replaced without touching the
/// state machine. `None` means any active participant may record the
/// entry. Stages absent from the table cannot be entered by a handler at
/// all (Manufactured only ever opens through product creation).
///
/// Default mapping: each stage is entered by the party taking custody;
/// Sold is recorded by the retailer in custody; Lost can be reported by
/// whichever active participant holds the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePolicy {
    rules: BTreeMap<Stage, Option<Role>>,
}

impl Default for StagePolicy {
    fn default() -> Self {
        let rules = BTreeMap::from([
            (Stage::Warehoused, Some(Role::Warehouse)),
            (Stage::Dispatched, Some(Role::Transporter)),
            (Stage::Distributor, Some(Role::Distributor)),
            (Stage::Retailer, Some(Role::Retailer)),
            (Stage::Sold, Some(Role::Retailer)),
            (Stage::Lost, None),
        ]);
        Self { rules }
    }
}

impl StagePolicy {
    pub fn allows(&self, entering: Stage, role: Role) -> bool {
        match self.rules.get(&entering) {
            Some(Some(required)) => *required == role,
            Some(None) => true,
            None => false,
        }
    }

    /// Replace the rule for one stage. `None` required role = any role.
    pub fn set_rule(&mut self, entering: Stage, required: Option<Role>) {
        self.rules.insert(entering, required);
    }
}
