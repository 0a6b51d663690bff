//! Error types for the simulation library.

use thiserror::Error;

/// Errors that can occur during reserve computations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A snapshot, stream or account field is malformed or out of range
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// A divisor that has no natural zero interpretation was zero
    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    /// A 256-bit intermediate product or sum overflowed
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Interest accrual was attempted with a timestamp before the last update
    #[error("Invalid interest accrual: timestamp {timestamp} is before last update {last_update}")]
    InvalidInterestAccrual { timestamp: u64, last_update: u64 },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
