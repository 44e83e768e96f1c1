//! Engine error taxonomy.
//!
//! Expected, auditable outcomes (validation, duplicates, risk gating,
//! gateway failures) are explicit variants so callers can distinguish them
//! from backend faults.

use thiserror::Error;

use hermes_gateway::GatewayError;
use hermes_store::StoreError;

use crate::ledger::LedgerError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or incomplete signal; user input, recovered locally.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identical fingerprint re-sent inside the dedup window.
    #[error("Duplicate signal: {0}")]
    DuplicateSignal(String),

    /// The risk engine refused the order. Expected, not a bug.
    #[error("Risk limit exceeded: {reason}")]
    RiskRejected { reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
