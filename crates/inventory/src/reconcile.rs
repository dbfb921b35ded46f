//! Inventory pipeline: stock balance, then fixed overrides, then bundle
//! subtraction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use orderflow_catalog::ExceptionIndex;
use orderflow_core::ValueObject;

use crate::stock::{ChannelInventoryRow, StockRecord};

/// Which tier produced the on-hand value before bundle subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnHandSource {
    /// Summed stock balance for the SKU's item name.
    Stock,
    /// No stock record; defaulted to zero.
    Default,
    /// Fixed quantity from the exception table.
    Fixed,
}

/// A channel row with its reconciled on-hand value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledInventoryRow {
    pub sku: String,
    pub on_hand: f64,
    pub source: OnHandSource,
    /// Amount removed because the SKU is a bundle parent (0 otherwise).
    pub bundle_subtracted: f64,
}

impl ValueObject for ReconciledInventoryRow {}

/// Resolves on-hand quantities for channel rows against one exception index.
#[derive(Debug, Clone, Copy)]
pub struct InventoryReconciler<'a> {
    exceptions: &'a ExceptionIndex,
}

impl<'a> InventoryReconciler<'a> {
    pub fn new(exceptions: &'a ExceptionIndex) -> Self {
        Self { exceptions }
    }

    /// Sum stock balances per item name; missing balances count as zero.
    pub fn base_on_hand(stock: &[StockRecord]) -> HashMap<&str, f64> {
        let mut base: HashMap<&str, f64> = HashMap::new();
        for record in stock {
            if record.item_name.is_empty() {
                continue;
            }
            *base.entry(record.item_name.as_str()).or_insert(0.0) += record.balance_qty.or(0.0);
        }
        base
    }

    /// Reconcile every channel row, preserving input order.
    ///
    /// Precedence, lowest first:
    /// 1. summed stock balance for the SKU (0 when absent);
    /// 2. the SKU's fixed quantity, which replaces tier 1;
    /// 3. minus the bundle subtraction when the SKU is a bundle parent,
    ///    applied on top of either tier and never clamped at zero.
    pub fn reconcile(
        &self,
        stock: &[StockRecord],
        channel: &[ChannelInventoryRow],
    ) -> Vec<ReconciledInventoryRow> {
        let base = Self::base_on_hand(stock);

        let rows: Vec<_> = channel
            .iter()
            .map(|row| {
                let (mut on_hand, source) = match self.exceptions.fixed_quantity_of(&row.sku) {
                    Some(fixed) => (fixed, OnHandSource::Fixed),
                    None => match base.get(row.sku.as_str()) {
                        Some(&balance) => (balance, OnHandSource::Stock),
                        None => (0.0, OnHandSource::Default),
                    },
                };

                let bundle_subtracted = self.exceptions.bundle_subtraction_of(&row.sku);
                on_hand -= bundle_subtracted;

                ReconciledInventoryRow {
                    sku: row.sku.clone(),
                    on_hand,
                    source,
                    bundle_subtracted,
                }
            })
            .collect();

        let count = |s: OnHandSource| rows.iter().filter(|r| r.source == s).count();
        tracing::debug!(
            rows = rows.len(),
            stock = count(OnHandSource::Stock),
            fixed = count(OnHandSource::Fixed),
            defaulted = count(OnHandSource::Default),
            negative = rows.iter().filter(|r| r.on_hand < 0.0).count(),
            "reconciled channel inventory"
        );
        rows
    }
}

/// Reconcile a channel inventory snapshot against stock and exceptions.
pub fn reconcile_inventory(
    stock: &[StockRecord],
    channel: &[ChannelInventoryRow],
    exceptions: &ExceptionIndex,
) -> Vec<ReconciledInventoryRow> {
    InventoryReconciler::new(exceptions).reconcile(stock, channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_catalog::ExceptionRule;
    use orderflow_core::Quantity;

    fn rule(sku: &str, mult: f64, parent: &str, fix: Option<f64>) -> ExceptionRule {
        ExceptionRule {
            variant_sku: sku.into(),
            quantity_multiplier: Quantity::Value(mult),
            item_name: Some(parent.into()),
            fixed_quantity: fix.into(),
        }
    }

    fn on_hand(rows: &[ReconciledInventoryRow]) -> Vec<f64> {
        rows.iter().map(|r| r.on_hand).collect()
    }

    #[test]
    fn end_to_end_stock_only_example() {
        let stock = vec![StockRecord::new("Y", 8.0)];
        let channel = vec![ChannelInventoryRow::new("Y")];

        let rows = reconcile_inventory(&stock, &channel, &ExceptionIndex::default());
        assert_eq!(
            rows,
            vec![ReconciledInventoryRow {
                sku: "Y".into(),
                on_hand: 8.0,
                source: OnHandSource::Stock,
                bundle_subtracted: 0.0,
            }]
        );
    }

    #[test]
    fn duplicate_stock_rows_are_summed() {
        let stock = vec![
            StockRecord::new("Y", 8.0),
            StockRecord::new("Y", 2.0),
            StockRecord::new("Y", Quantity::Missing),
        ];
        let rows = reconcile_inventory(&stock, &[ChannelInventoryRow::new("Y")], &ExceptionIndex::default());
        assert_eq!(on_hand(&rows), vec![10.0]);
    }

    #[test]
    fn unknown_sku_defaults_to_zero() {
        let rows = reconcile_inventory(&[], &[ChannelInventoryRow::new("Z")], &ExceptionIndex::default());
        assert_eq!(on_hand(&rows), vec![0.0]);
        assert_eq!(rows[0].source, OnHandSource::Default);
    }

    #[test]
    fn fixed_quantity_replaces_stock() {
        let stock = vec![StockRecord::new("Y", 10.0)];
        let exceptions = ExceptionIndex::build(&[rule("Y", 1.0, "Unrelated", Some(20.0))]);
        let mut channel_row = ChannelInventoryRow::new("Y");
        channel_row.on_hand = Some(99.0);

        let rows = reconcile_inventory(&stock, &[channel_row], &exceptions);
        assert_eq!(on_hand(&rows), vec![20.0]);
        assert_eq!(rows[0].source, OnHandSource::Fixed);
    }

    #[test]
    fn bundle_subtraction_stacks_with_fixed_quantity() {
        // "Y" is fixed at 20 and is the parent of a component tracking 5 units.
        let exceptions = ExceptionIndex::build(&[
            rule("Y", 1.0, "Unrelated", Some(20.0)),
            rule("Y-PART", 1.0, "Y", Some(5.0)),
        ]);
        let rows = reconcile_inventory(
            &[StockRecord::new("Y", 10.0)],
            &[ChannelInventoryRow::new("Y")],
            &exceptions,
        );
        assert_eq!(on_hand(&rows), vec![15.0]);
        assert_eq!(rows[0].bundle_subtracted, 5.0);
    }

    #[test]
    fn bundle_subtraction_uses_multiplier_and_may_go_negative() {
        let exceptions = ExceptionIndex::build(&[
            rule("A", 2.0, "BUNDLE", Some(3.0)),
            rule("B", 1.0, "BUNDLE", Some(4.0)),
        ]);
        let rows = reconcile_inventory(
            &[StockRecord::new("BUNDLE", 7.0)],
            &[ChannelInventoryRow::new("BUNDLE")],
            &exceptions,
        );
        assert_eq!(on_hand(&rows), vec![7.0 - 10.0]);
        assert_eq!(rows[0].source, OnHandSource::Stock);
    }

    #[test]
    fn components_take_their_fixed_quantity() {
        let exceptions = ExceptionIndex::build(&[
            rule("A", 2.0, "BUNDLE", Some(3.0)),
            rule("A", 1.0, "OTHER", Some(4.0)),
        ]);
        let rows = reconcile_inventory(&[], &[ChannelInventoryRow::new("A")], &exceptions);
        assert_eq!(on_hand(&rows), vec![7.0]);
    }

    #[test]
    fn input_order_is_preserved() {
        let stock = vec![StockRecord::new("a", 1.0), StockRecord::new("b", 2.0)];
        let channel = vec![
            ChannelInventoryRow::new("b"),
            ChannelInventoryRow::new("c"),
            ChannelInventoryRow::new("a"),
            ChannelInventoryRow::new("b"),
        ];
        let rows = reconcile_inventory(&stock, &channel, &ExceptionIndex::default());
        let skus: Vec<_> = rows.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["b", "c", "a", "b"]);
        assert_eq!(on_hand(&rows), vec![2.0, 0.0, 1.0, 2.0]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: one output row per channel row, same SKUs, same order.
            #[test]
            fn every_channel_row_is_reconciled(
                skus in prop::collection::vec("[a-e]{1,2}", 0..40),
                balances in prop::collection::vec(("[a-e]{1,2}", -50i32..50), 0..40),
            ) {
                let stock: Vec<_> = balances
                    .iter()
                    .map(|(name, q)| StockRecord::new(name.clone(), f64::from(*q)))
                    .collect();
                let channel: Vec<_> = skus.iter().map(ChannelInventoryRow::new).collect();

                let rows = reconcile_inventory(&stock, &channel, &ExceptionIndex::default());
                prop_assert_eq!(rows.len(), channel.len());
                for (row, sku) in rows.iter().zip(&skus) {
                    prop_assert_eq!(&row.sku, sku);
                    let expected: f64 = balances
                        .iter()
                        .filter(|(name, _)| name == sku)
                        .map(|(_, q)| f64::from(*q))
                        .fold(0.0, |acc, q| acc + q);
                    prop_assert_eq!(row.on_hand, expected);
                }
            }
        }
    }
}
