use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use orderflow_core::{DomainResult, Quantity, Table, ValueObject};

/// Column names of the catalog table.
pub mod columns {
    pub const ID: &str = "ID";
    pub const ITEM_NAME: &str = "Item Name";
    pub const AMOUNT: &str = "Amount";
    pub const DEFAULT_UOM: &str = "Default Unit of Measure";
}

/// One sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_code: String,
    /// Join key for canonical SKUs and bundle components.
    pub item_name: String,
    /// Unit price/cost. Missing when the cell is blank or not numeric.
    pub unit_amount: Quantity,
    pub default_unit_of_measure: String,
}

impl ValueObject for CatalogEntry {}

/// How a name that appears on several catalog rows is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogJoin {
    /// Every matching row produces an output row (left-join fan-out).
    #[default]
    FanOut,
    /// Only the first matching row in catalog order is used.
    FirstMatch,
}

impl FromStr for CatalogJoin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan-out" => Ok(Self::FanOut),
            "first-match" => Ok(Self::FirstMatch),
            other => Err(format!(
                "unknown catalog join '{other}' (expected fan-out or first-match)"
            )),
        }
    }
}

/// The catalog, indexed by item name.
///
/// Entries are kept in input order and never deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, Vec<usize>>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_name.entry(entry.item_name.clone()).or_default().push(idx);
        }
        Self { entries, by_name }
    }

    /// Build from a table carrying `ID`, `Item Name`, `Amount` and
    /// `Default Unit of Measure`.
    pub fn from_table(table: &Table) -> DomainResult<Self> {
        let id = table.require(columns::ID)?;
        let name = table.require(columns::ITEM_NAME)?;
        let amount = table.require(columns::AMOUNT)?;
        let uom = table.require(columns::DEFAULT_UOM)?;

        let entries = table
            .rows()
            .map(|row| CatalogEntry {
                item_code: row.get(id).to_string(),
                item_name: row.get(name).to_string(),
                unit_amount: Quantity::coerce(row.get(amount)),
                default_unit_of_measure: row.get(uom).to_string(),
            })
            .collect();

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog rows whose item name equals `item_name`, in catalog order.
    ///
    /// Empty when the name is unknown; the caller keeps the row with blank
    /// catalog fields.
    pub fn lookup(&self, item_name: &str, join: CatalogJoin) -> Vec<&CatalogEntry> {
        let Some(indices) = self.by_name.get(item_name) else {
            return Vec::new();
        };
        let take = match join {
            CatalogJoin::FanOut => indices.len(),
            CatalogJoin::FirstMatch => 1,
        };
        indices.iter().take(take).map(|&i| &self.entries[i]).collect()
    }
}
