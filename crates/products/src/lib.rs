//! Product lifecycle tracking.
//!
//! Owns `Product` records and their append-only stage history. A product
//! moves through a fixed total order of stages (with one branch to Lost),
//! and every movement closes the previous custody record and opens the
//! next one atomically.

pub mod product;
pub mod stage;

pub use product::{Product, ProductAdded, ProductEvent, ProductStageUpdated, ProductStore, StageRecord};
pub use stage::{Stage, StagePolicy};
