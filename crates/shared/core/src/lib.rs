//! Hermes Core Domain
//!
//! Pure domain types for the Hermes alert-to-order service.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;

// Re-export commonly used types at crate root
pub use entities::{
    DEFAULT_AUTOMATIC_STRATEGY,
    // Signal intake
    OrderKind,
    // Order audit log
    OrderRecord,
    OrderStatus,
    OrderType,
    // Pending-signal workflow
    PendingSignal,
    PendingStatus,
    // Position ledger
    Position,
    PositionSide,
    PositionStatus,
    Side,
    SignalAction,
    SignalRecord,
    // Routing strategies
    Strategy,
    StrategyKind,
    VenueKind,
};
