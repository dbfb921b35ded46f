use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use orderflow_core::{DomainResult, Quantity, Table, ValueObject};

/// Column names of the exception table.
pub mod columns {
    pub const VARIANT_SKU: &str = "Variant SKU";
    pub const QUANTITY: &str = "Quantity";
    pub const ITEM_NAME: &str = "Item Name";
    pub const FIX_QTY: &str = "Fix Qty";
}

/// One row of the exception table.
///
/// `item_name` plays two roles: it is the canonical name the SKU is renamed
/// to, and the bundle parent the row's fixed quantity is subtracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRule {
    pub variant_sku: String,
    pub quantity_multiplier: Quantity,
    pub item_name: Option<String>,
    pub fixed_quantity: Quantity,
}

impl ValueObject for ExceptionRule {}

impl ExceptionRule {
    /// Parse the exception table. `Fix Qty` is optional: without it every
    /// rule has a missing fixed quantity.
    pub fn from_table(table: &Table) -> DomainResult<Vec<Self>> {
        let sku = table.require(columns::VARIANT_SKU)?;
        let quantity = table.require(columns::QUANTITY)?;
        let name = table.require(columns::ITEM_NAME)?;
        let fix_qty = table.column(columns::FIX_QTY);

        Ok(table
            .rows()
            .map(|row| ExceptionRule {
                variant_sku: row.get(sku).to_string(),
                quantity_multiplier: Quantity::coerce(row.get(quantity)),
                item_name: row.optional(name),
                fixed_quantity: fix_qty
                    .map(|idx| Quantity::coerce(row.get(idx)))
                    .unwrap_or_default(),
            })
            .collect())
    }
}

/// Lookup structures derived from the exception table.
///
/// Duplicate SKUs resolve differently per mapping:
/// - multiplier and canonical name: the last row wins;
/// - fixed quantity: summed over every row of the SKU;
/// - bundle subtraction: `fixed_quantity * quantity_multiplier` summed per
///   item name.
#[derive(Debug, Clone, Default)]
pub struct ExceptionIndex {
    multipliers: HashMap<String, Quantity>,
    canonical_names: HashMap<String, Option<String>>,
    fixed_quantities: HashMap<String, f64>,
    bundle_subtractions: HashMap<String, f64>,
    rules: usize,
}

impl ExceptionIndex {
    pub fn build(rules: &[ExceptionRule]) -> Self {
        let mut index = Self {
            rules: rules.len(),
            ..Self::default()
        };

        for rule in rules {
            if !rule.variant_sku.is_empty() {
                let sku = rule.variant_sku.clone();
                index
                    .multipliers
                    .insert(sku.clone(), rule.quantity_multiplier);
                index
                    .canonical_names
                    .insert(sku.clone(), rule.item_name.clone());
                *index.fixed_quantities.entry(sku).or_insert(0.0) +=
                    rule.fixed_quantity.or(0.0);
            }

            if let Some(parent) = &rule.item_name {
                if let Some(total) = (rule.fixed_quantity * rule.quantity_multiplier).value() {
                    *index
                        .bundle_subtractions
                        .entry(parent.clone())
                        .or_insert(0.0) += total;
                }
            }
        }

        index
    }

    pub fn from_table(table: &Table) -> DomainResult<Self> {
        Ok(Self::build(&ExceptionRule::from_table(table)?))
    }

    /// Like [`Self::from_table`], but `Fix Qty` is required: the inventory
    /// pipeline's fixed overrides come from it.
    pub fn for_inventory(table: &Table) -> DomainResult<Self> {
        let rules = ExceptionRule::from_table(table)?;
        table.require(columns::FIX_QTY)?;
        Ok(Self::build(&rules))
    }

    /// Quantity multiplier for a raw SKU; 1 when unmapped or blank.
    pub fn multiplier_of(&self, sku: &str) -> f64 {
        self.multipliers
            .get(sku)
            .and_then(|q| q.value())
            .unwrap_or(1.0)
    }

    /// Canonical item name for a raw SKU; the SKU itself when unmapped.
    ///
    /// A SKU whose winning rule has a blank `Item Name` maps to `""`, which
    /// the order pipeline drops.
    pub fn canonical_name_of<'a>(&'a self, sku: &'a str) -> &'a str {
        match self.canonical_names.get(sku) {
            Some(Some(name)) => name.as_str(),
            Some(None) => "",
            None => sku,
        }
    }

    /// Summed fixed quantity for a SKU, if the SKU appears in the table.
    pub fn fixed_quantity_of(&self, sku: &str) -> Option<f64> {
        self.fixed_quantities.get(sku).copied()
    }

    /// Quantity tracked through components of the bundle `parent_name`; 0
    /// when nothing is tracked.
    pub fn bundle_subtraction_of(&self, parent_name: &str) -> f64 {
        self.bundle_subtractions
            .get(parent_name)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_bundle_parent(&self, name: &str) -> bool {
        self.bundle_subtractions.contains_key(name)
    }

    /// Number of exception rows the index was built from.
    pub fn rule_count(&self) -> usize {
        self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_core::DomainError;

    fn rule(sku: &str, mult: &str, name: &str, fix: &str) -> ExceptionRule {
        ExceptionRule {
            variant_sku: sku.to_string(),
            quantity_multiplier: Quantity::coerce(mult),
            item_name: (!name.is_empty()).then(|| name.to_string()),
            fixed_quantity: Quantity::coerce(fix),
        }
    }

    #[test]
    fn unmapped_skus_resolve_to_defaults() {
        let index = ExceptionIndex::build(&[]);
        assert_eq!(index.multiplier_of("X"), 1.0);
        assert_eq!(index.canonical_name_of("X"), "X");
        assert_eq!(index.fixed_quantity_of("X"), None);
        assert_eq!(index.bundle_subtraction_of("X"), 0.0);
        assert!(index.is_empty());
    }

    #[test]
    fn multiplier_and_name_use_last_row() {
        let index = ExceptionIndex::build(&[
            rule("PACK", "6", "Widget", ""),
            rule("PACK", "12", "Gadget", ""),
        ]);
        assert_eq!(index.multiplier_of("PACK"), 12.0);
        assert_eq!(index.canonical_name_of("PACK"), "Gadget");
    }

    #[test]
    fn missing_multiplier_on_winning_row_falls_back_to_one() {
        let index = ExceptionIndex::build(&[
            rule("PACK", "6", "Widget", ""),
            rule("PACK", "", "Widget", ""),
        ]);
        assert_eq!(index.multiplier_of("PACK"), 1.0);
    }

    #[test]
    fn blank_canonical_name_maps_to_blank() {
        let index = ExceptionIndex::build(&[rule("PACK", "2", "", "")]);
        assert_eq!(index.canonical_name_of("PACK"), "");
        assert_eq!(index.multiplier_of("PACK"), 2.0);

        // Only the winning row counts.
        let renamed_later = ExceptionIndex::build(&[
            rule("PACK", "2", "", ""),
            rule("PACK", "2", "Widget", ""),
        ]);
        assert_eq!(renamed_later.canonical_name_of("PACK"), "Widget");
    }

    #[test]
    fn fixed_quantity_is_summed_across_rows() {
        let index = ExceptionIndex::build(&[
            rule("COMP", "1", "BundleA", "3"),
            rule("COMP", "1", "BundleB", "4"),
        ]);
        assert_eq!(index.fixed_quantity_of("COMP"), Some(7.0));
    }

    #[test]
    fn sku_without_fixed_quantity_still_has_entry() {
        let index = ExceptionIndex::build(&[rule("PACK", "6", "Widget", "")]);
        assert_eq!(index.fixed_quantity_of("PACK"), Some(0.0));
    }

    #[test]
    fn bundle_subtraction_groups_by_parent_name() {
        let index = ExceptionIndex::build(&[
            rule("A", "2", "Bundle", "3"),
            rule("B", "1", "Bundle", "4"),
            rule("C", "5", "Other", ""),
        ]);
        assert_eq!(index.bundle_subtraction_of("Bundle"), 2.0 * 3.0 + 4.0);
        assert!(index.is_bundle_parent("Bundle"));
        assert!(!index.is_bundle_parent("Other"));
        assert_eq!(index.bundle_subtraction_of("Other"), 0.0);
    }

    #[test]
    fn from_table_tolerates_missing_fix_qty_column() {
        let table = Table::from_literal(
            "exceptions",
            &["Variant SKU", "Quantity", "Item Name"],
            &[&["X", "1", "Widget"]],
        )
        .unwrap();
        let rules = ExceptionRule::from_table(&table).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].fixed_quantity.is_missing());
        assert_eq!(rules[0].item_name.as_deref(), Some("Widget"));
    }

    #[test]
    fn inventory_index_requires_fix_qty_column() {
        let table = Table::from_literal(
            "exceptions",
            &["Variant SKU", "Quantity", "Item Name"],
            &[&["Y", "2", "Widget"]],
        )
        .unwrap();
        assert!(ExceptionIndex::from_table(&table).is_ok());
        assert_eq!(
            ExceptionIndex::for_inventory(&table).unwrap_err(),
            DomainError::missing_column("exceptions", "Fix Qty")
        );
    }

    #[test]
    fn inventory_index_reads_fix_qty() {
        let table = Table::from_literal(
            "exceptions",
            &["Variant SKU", "Quantity", "Item Name", "Fix Qty"],
            &[&["Y", "2", "Widget", "5"]],
        )
        .unwrap();
        let index = ExceptionIndex::for_inventory(&table).unwrap();
        assert_eq!(index.fixed_quantity_of("Y"), Some(5.0));
        assert_eq!(index.bundle_subtraction_of("Widget"), 10.0);
    }

    #[test]
    fn from_table_requires_item_name() {
        let table =
            Table::from_literal("exceptions", &["Variant SKU", "Quantity"], &[]).unwrap();
        let err = ExceptionIndex::from_table(&table).unwrap_err();
        assert_eq!(err, DomainError::missing_column("exceptions", "Item Name"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: fixed quantities for one SKU sum regardless of how the
            /// rows are split.
            #[test]
            fn fixed_quantity_sums_every_row(fixes in prop::collection::vec(0u32..1000, 1..20)) {
                let rules: Vec<_> = fixes
                    .iter()
                    .map(|f| rule("SKU", "1", "Parent", &f.to_string()))
                    .collect();
                let index = ExceptionIndex::build(&rules);
                let expected: f64 = fixes.iter().map(|&f| f64::from(f)).sum();
                prop_assert_eq!(index.fixed_quantity_of("SKU"), Some(expected));
                prop_assert_eq!(index.bundle_subtraction_of("Parent"), expected);
            }
        }
    }
}
