//! Plan error types

use thiserror::Error;

/// Errors surfaced by reconciliation and the plan controller
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Trade {id} has a non-finite result: {value}")]
    NonFiniteResult { id: String, value: f64 },

    #[error("Starting balance must be finite, got {0}")]
    NonFiniteBalance(f64),

    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Type alias for plan results
pub type PlanResult<T> = Result<T, PlanError>;
