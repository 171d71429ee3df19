//! Batch catalog: immutable production batches that products reference.

pub mod batch;

pub use batch::{Batch, BatchCatalog, BatchCreated, CatalogEvent};
