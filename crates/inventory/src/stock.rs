use serde::{Deserialize, Serialize};

use orderflow_core::{DomainResult, Quantity, Table, ValueObject};

/// Column names of the stock snapshot and channel inventory export.
pub mod columns {
    pub const ITEM_NAME: &str = "Item Name";
    pub const BALANCE_QTY: &str = "Balance Qty";
    pub const SKU: &str = "SKU";
    pub const ON_HAND: &str = "On hand";
}

/// Stock balance for one item (per warehouse row; names may repeat).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub item_name: String,
    pub balance_qty: Quantity,
}

impl StockRecord {
    pub fn new(item_name: impl Into<String>, balance_qty: impl Into<Quantity>) -> Self {
        Self {
            item_name: item_name.into(),
            balance_qty: balance_qty.into(),
        }
    }

    pub fn from_table(table: &Table) -> DomainResult<Vec<Self>> {
        let name = table.require(columns::ITEM_NAME)?;
        let balance = table.require(columns::BALANCE_QTY)?;

        Ok(table
            .rows()
            .map(|row| StockRecord::new(row.get(name), Quantity::coerce(row.get(balance))))
            .collect())
    }
}

impl ValueObject for StockRecord {}

/// One row of the sales channel inventory export.
///
/// `on_hand` is whatever the channel reported; reconciliation replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInventoryRow {
    pub sku: String,
    pub on_hand: Option<f64>,
}

impl ChannelInventoryRow {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            on_hand: None,
        }
    }

    /// Parse a channel export. Only `SKU` is required; an existing `On hand`
    /// column is read but will be overwritten.
    pub fn from_table(table: &Table) -> DomainResult<Vec<Self>> {
        let sku = table.require(columns::SKU)?;
        let on_hand = table.column(columns::ON_HAND);

        Ok(table
            .rows()
            .map(|row| ChannelInventoryRow {
                sku: row.get(sku).to_string(),
                on_hand: on_hand.and_then(|idx| Quantity::coerce(row.get(idx)).value()),
            })
            .collect())
    }
}

impl ValueObject for ChannelInventoryRow {}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_core::DomainError;

    #[test]
    fn stock_from_table_coerces_balances() {
        let table = Table::from_literal(
            "stock",
            &["Warehouse", "Item Name", "Balance Qty"],
            &[&["Main", "Widget", "8"], &["Main", "Gadget", "-"]],
        )
        .unwrap();

        let stock = StockRecord::from_table(&table).unwrap();
        assert_eq!(stock[0], StockRecord::new("Widget", 8.0));
        assert!(stock[1].balance_qty.is_missing());
    }

    #[test]
    fn channel_from_table_reads_existing_on_hand() {
        let table = Table::from_literal(
            "channel",
            &["Handle", "SKU", "On hand"],
            &[&["w", "Widget", "3"], &["g", "Gadget", ""]],
        )
        .unwrap();

        let rows = ChannelInventoryRow::from_table(&table).unwrap();
        assert_eq!(rows[0].on_hand, Some(3.0));
        assert_eq!(rows[1].on_hand, None);
    }

    #[test]
    fn channel_requires_sku() {
        let table = Table::from_literal("channel", &["Handle"], &[]).unwrap();
        assert_eq!(
            ChannelInventoryRow::from_table(&table).unwrap_err(),
            DomainError::missing_column("channel", "SKU")
        );
    }
}
