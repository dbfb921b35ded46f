//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Every record flowing through the pipelines (catalog entries, order lines,
/// delivery lines, reconciled rows) is a value object: it has no identity of
/// its own and two records with the same fields are interchangeable. The
/// pipelines never mutate their inputs; they build new values instead.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct StockRecord {
///     item_name: String,
///     balance_qty: Quantity,
/// }
///
/// impl ValueObject for StockRecord {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
