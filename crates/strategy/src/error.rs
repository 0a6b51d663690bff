//! Error types for the strategy crate.

use aave_rs_sim::SimError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while sizing or summarizing positions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The closed form has no meaningful solution for these inputs
    #[error("{operation} does not converge: denominator {denominator}")]
    NonConvergent {
        operation: &'static str,
        denominator: Decimal,
    },

    #[error("Decimal overflow in {operation}")]
    Overflow { operation: &'static str },

    /// An integer value does not fit the decimal representation
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Sim(#[from] SimError),
}

impl StrategyError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;
