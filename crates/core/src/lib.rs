//! `orderflow-core`: shared building blocks for the order and inventory pipelines.
//!
//! This crate contains **pure domain** primitives (no IO, no logging setup).

pub mod error;
pub mod quantity;
pub mod table;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use quantity::Quantity;
pub use table::{Row, Table};
pub use value_object::ValueObject;
