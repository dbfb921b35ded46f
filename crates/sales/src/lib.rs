//! Sales orders module: raw channel orders to delivery note lines.
//!
//! This crate contains the order pipeline, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod delivery;
pub mod order;
pub mod transform;

pub use delivery::DeliveryLine;
pub use order::OrderLine;
pub use transform::{BUNDLE_DELIMITER, OrderTransformer, RESERVED_SKU_PREFIXES, transform_orders};
