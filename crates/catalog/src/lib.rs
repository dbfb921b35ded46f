//! Reference tables module.
//!
//! The catalog of sellable items and the SKU exception table, plus the lookup
//! structures both pipelines derive from them. Pure domain logic (no IO).

pub mod catalog;
pub mod exception;

pub use catalog::{Catalog, CatalogEntry, CatalogJoin};
pub use exception::{ExceptionIndex, ExceptionRule};
