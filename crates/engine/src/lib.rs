//! Hermes signal pipeline.
//!
//! Alert in, order out: intake (dedup, validation, routing), risk gating,
//! exchange execution with a complete audit trail, position bookkeeping,
//! and the manual-approval workflow for human-reviewed strategies.

mod dedup;
mod error;
mod execution;
mod intake;
mod ledger;
mod pending;
mod risk;

pub use dedup::DedupCache;
pub use error::{EngineError, Result};
pub use execution::ExecutionEngine;
pub use intake::{InboundAlert, SignalIntake, SubmitOutcome};
pub use ledger::{LedgerError, LedgerResult, PositionLedger};
pub use pending::PendingWorkflow;
pub use risk::{RiskEngine, RiskLimits, RiskVerdict};
