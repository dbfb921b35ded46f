use serde::{Deserialize, Serialize};

use orderflow_core::{DomainResult, Quantity, Table, ValueObject};

/// Column names of the order export.
pub mod columns {
    pub const VARIANT_SKU: &str = "Variant SKU";
    pub const QUANTITY: &str = "Quantity";
}

/// Order line: SKU and quantity, as exported by the sales channel.
///
/// Lines are un-deduplicated; several lines may share a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub variant_sku: String,
    pub quantity: Quantity,
    /// Set when `variant_sku` is already a canonical item name. Canonical
    /// lines skip the multiplier and rename steps.
    #[serde(default)]
    pub canonical: bool,
}

impl OrderLine {
    /// A line straight from a channel export.
    pub fn raw(variant_sku: impl Into<String>, quantity: impl Into<Quantity>) -> Self {
        Self {
            variant_sku: variant_sku.into(),
            quantity: quantity.into(),
            canonical: false,
        }
    }

    /// A line whose SKU was already canonicalized by a previous run.
    pub fn canonical(variant_sku: impl Into<String>, quantity: impl Into<Quantity>) -> Self {
        Self {
            variant_sku: variant_sku.into(),
            quantity: quantity.into(),
            canonical: true,
        }
    }

    /// Parse an order export carrying `Variant SKU` and `Quantity`.
    ///
    /// Quantities that do not parse become missing; they are never an error.
    pub fn from_table(table: &Table) -> DomainResult<Vec<Self>> {
        let sku = table.require(columns::VARIANT_SKU)?;
        let quantity = table.require(columns::QUANTITY)?;

        Ok(table
            .rows()
            .map(|row| OrderLine::raw(row.get(sku), Quantity::coerce(row.get(quantity))))
            .collect())
    }
}

impl ValueObject for OrderLine {}
