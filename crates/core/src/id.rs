//! Strongly-typed identifiers used across the ledger.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Wallet address: the opaque, immutable identity of a participant.
///
/// Canonical form is `0x` followed by 40 hex digits, lowercased. Parsing
/// lowercases the input so two spellings of the same address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| LedgerError::validation("wallet", "must start with 0x"))?;
        if hex.len() != 40 {
            return Err(LedgerError::validation(
                "wallet",
                format!("expected 40 hex digits, got {}", hex.len()),
            ));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LedgerError::validation("wallet", "non-hex digit in address"));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// Identifier of a batch. Dense and monotonic, assigned by the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

/// Identifier of a product. Dense and monotonic, assigned by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

macro_rules! impl_sequence_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// The first identifier a store hands out.
            pub const FIRST: Self = Self(1);

            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }

            /// The identifier assigned after this one. Never reused.
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = u64::from_str(s)
                    .map_err(|e| LedgerError::validation($name, e.to_string()))?;
                Ok(Self(value))
            }
        }
    };
}

impl_sequence_newtype!(BatchId, "batch id");
impl_sequence_newtype!(ProductId, "product id");
