//! Inventory module: corrected on-hand feed for the sales channel.
//!
//! This crate contains the inventory reconciliation pipeline, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod reconcile;
pub mod stock;

pub use reconcile::{InventoryReconciler, OnHandSource, ReconciledInventoryRow, reconcile_inventory};
pub use stock::{ChannelInventoryRow, StockRecord};
