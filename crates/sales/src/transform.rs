//! Order pipeline: filter, multiply, rename, aggregate, expand bundles, join.

use std::collections::BTreeMap;

use orderflow_catalog::{Catalog, CatalogJoin, ExceptionIndex};

use crate::delivery::DeliveryLine;
use crate::order::OrderLine;

/// SKU prefixes of channel placeholder lines (routing insurance, kitting)
/// that never ship.
pub const RESERVED_SKU_PREFIXES: [&str; 2] = ["ROUTEINS", "KITE"];

/// Separator between component names in a bundle SKU.
pub const BUNDLE_DELIMITER: &str = "+";

/// Turns raw order lines into delivery note lines.
///
/// The defaults match the channel export conventions; see
/// [`RESERVED_SKU_PREFIXES`], [`BUNDLE_DELIMITER`] and [`CatalogJoin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransformer {
    reserved_prefixes: Vec<String>,
    bundle_delimiter: String,
    catalog_join: CatalogJoin,
}

impl Default for OrderTransformer {
    fn default() -> Self {
        Self {
            reserved_prefixes: RESERVED_SKU_PREFIXES.iter().map(|p| p.to_string()).collect(),
            bundle_delimiter: BUNDLE_DELIMITER.to_string(),
            catalog_join: CatalogJoin::default(),
        }
    }
}

impl OrderTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reserved_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// An empty delimiter disables bundle expansion.
    pub fn with_bundle_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.bundle_delimiter = delimiter.into();
        self
    }

    pub fn with_catalog_join(mut self, join: CatalogJoin) -> Self {
        self.catalog_join = join;
        self
    }

    pub fn reserved_prefixes(&self) -> &[String] {
        &self.reserved_prefixes
    }

    pub fn bundle_delimiter(&self) -> &str {
        &self.bundle_delimiter
    }

    pub fn catalog_join(&self) -> CatalogJoin {
        self.catalog_join
    }

    pub fn is_reserved(&self, sku: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| sku.starts_with(prefix.as_str()))
    }

    /// Total quantity per canonical SKU, in ascending SKU order.
    ///
    /// Reserved lines are dropped, raw lines are multiplied and renamed, and
    /// missing quantities count as zero. Lines left without a SKU are dropped.
    pub fn aggregate(&self, orders: &[OrderLine], exceptions: &ExceptionIndex) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut reserved = 0usize;
        let mut malformed = 0usize;
        let mut blank = 0usize;

        for line in orders {
            if self.is_reserved(&line.variant_sku) {
                reserved += 1;
                continue;
            }
            if line.quantity.is_missing() {
                malformed += 1;
            }

            let (sku, quantity) = if line.canonical {
                (line.variant_sku.as_str(), line.quantity)
            } else {
                (
                    exceptions.canonical_name_of(&line.variant_sku),
                    line.quantity * exceptions.multiplier_of(&line.variant_sku),
                )
            };

            if sku.is_empty() {
                blank += 1;
                continue;
            }
            *totals.entry(sku.to_string()).or_insert(0.0) += quantity.or(0.0);
        }

        tracing::debug!(
            lines = orders.len(),
            reserved,
            malformed,
            blank,
            skus = totals.len(),
            "aggregated order lines"
        );
        totals
    }

    /// Component names of a canonical SKU. A SKU without the delimiter is its
    /// own single component.
    pub fn components<'a>(&self, sku: &'a str) -> Vec<&'a str> {
        if self.bundle_delimiter.is_empty() {
            return vec![sku];
        }
        let parts: Vec<&str> = sku
            .split(self.bundle_delimiter.as_str())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() { vec![sku] } else { parts }
    }

    /// Run the full pipeline.
    ///
    /// Every component produces at least one line; components without a
    /// catalog row are kept with blank catalog fields. With
    /// [`CatalogJoin::FanOut`] a component matching several catalog rows
    /// produces one line per row.
    pub fn transform(
        &self,
        orders: &[OrderLine],
        catalog: &Catalog,
        exceptions: &ExceptionIndex,
    ) -> Vec<DeliveryLine> {
        let totals = self.aggregate(orders, exceptions);
        let mut lines = Vec::with_capacity(totals.len());
        let mut unmatched = 0usize;

        for (sku, qty) in &totals {
            for component in self.components(sku) {
                let entries = catalog.lookup(component, self.catalog_join);
                if entries.is_empty() {
                    unmatched += 1;
                    lines.push(DeliveryLine::unmatched(component, *qty));
                } else {
                    lines.extend(entries.into_iter().enumerate().map(|(i, entry)| {
                        let mut line = DeliveryLine::matched(component, *qty, entry);
                        line.fan_out = i > 0;
                        line
                    }));
                }
            }
        }

        if unmatched > 0 {
            tracing::warn!(unmatched, "delivery lines without a catalog match");
        }
        tracing::debug!(lines = lines.len(), "built delivery note");
        lines
    }
}

/// Transform raw orders into delivery note lines with the default settings.
pub fn transform_orders(
    orders: &[OrderLine],
    catalog: &Catalog,
    exceptions: &ExceptionIndex,
) -> Vec<DeliveryLine> {
    OrderTransformer::default().transform(orders, catalog, exceptions)
}
