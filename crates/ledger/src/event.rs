//! The combined event type recorded by the ledger journal.

use serde::{Deserialize, Serialize};

use supplytrace_catalog::CatalogEvent;
use supplytrace_identity::IdentityEvent;
use supplytrace_journal::Event;
use supplytrace_products::ProductEvent;

/// One domain event from any ledger component.
///
/// The journal stores these in exact commit order; subscribers match on
/// the variant (or on [`Event::kind`]) to update their own views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Identity(IdentityEvent),
    Catalog(CatalogEvent),
    Product(ProductEvent),
}

impl Event for LedgerEvent {
    fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::Identity(e) => e.kind(),
            LedgerEvent::Catalog(e) => e.kind(),
            LedgerEvent::Product(e) => e.kind(),
        }
    }
}

impl From<IdentityEvent> for LedgerEvent {
    fn from(value: IdentityEvent) -> Self {
        Self::Identity(value)
    }
}

impl From<CatalogEvent> for LedgerEvent {
    fn from(value: CatalogEvent) -> Self {
        Self::Catalog(value)
    }
}

impl From<ProductEvent> for LedgerEvent {
    fn from(value: ProductEvent) -> Self {
        Self::Product(value)
    }
}
