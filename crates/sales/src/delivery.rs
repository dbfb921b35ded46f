use serde::{Deserialize, Serialize};

use orderflow_catalog::CatalogEntry;
use orderflow_core::ValueObject;

use crate::order::OrderLine;

/// One delivery note line: a canonical SKU (or bundle component) and the
/// catalog metadata it joined to.
///
/// Catalog-derived fields are `None` when the component has no catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLine {
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    /// The canonical SKU or bundle component this line was built from.
    pub description: String,
    pub qty: f64,
    pub stock_uom: Option<String>,
    pub uom: Option<String>,
    /// `qty * unit_amount`; `None` when unmatched or the price is blank.
    pub amount: Option<f64>,
    /// Set on the second and later lines a component produced by matching
    /// several catalog rows. These repeat the first line's quantity.
    #[serde(default)]
    pub fan_out: bool,
}

impl DeliveryLine {
    /// Output column order of the delivery note template.
    pub const COLUMNS: [&'static str; 7] = [
        "item_code",
        "item_name",
        "description",
        "qty",
        "stock_uom",
        "uom",
        "amount",
    ];

    /// A line whose component matched `entry`.
    pub fn matched(description: &str, qty: f64, entry: &CatalogEntry) -> Self {
        Self {
            item_code: Some(entry.item_code.clone()),
            item_name: Some(entry.item_name.clone()),
            description: description.to_string(),
            qty,
            stock_uom: Some(entry.default_unit_of_measure.clone()),
            uom: Some(entry.default_unit_of_measure.clone()),
            amount: (entry.unit_amount * qty).value(),
            fan_out: false,
        }
    }

    /// A line whose component has no catalog row.
    pub fn unmatched(description: &str, qty: f64) -> Self {
        Self {
            item_code: None,
            item_name: None,
            description: description.to_string(),
            qty,
            stock_uom: None,
            uom: None,
            amount: None,
            fan_out: false,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.item_name.is_some()
    }

    /// Feed this line back into the order pipeline without re-applying
    /// multipliers or renames.
    ///
    /// Fan-out repeats yield `None` so the quantity is replayed once per
    /// component, not once per matching catalog row.
    pub fn to_order_line(&self) -> Option<OrderLine> {
        (!self.fan_out).then(|| OrderLine::canonical(self.description.clone(), self.qty))
    }

    /// Cells in [`Self::COLUMNS`] order; absent values render blank.
    pub fn to_record(&self) -> [String; 7] {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            opt(&self.item_code),
            opt(&self.item_name),
            self.description.clone(),
            self.qty.to_string(),
            opt(&self.stock_uom),
            opt(&self.uom),
            self.amount.map(|a| a.to_string()).unwrap_or_default(),
        ]
    }
}

impl ValueObject for DeliveryLine {}
