//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only *structural* problems with an input table surface here. Bad cell
/// values (unparseable quantities, unknown SKUs) are recovered locally by the
/// pipelines and never become errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A table is missing a column its contract requires.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A table is shaped in a way no pipeline can interpret.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
