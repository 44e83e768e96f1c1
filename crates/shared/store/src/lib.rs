//! Hermes Store
//!
//! Persistence ports (traits) for the Hermes alert-to-order service.
//! These define the boundary between the engine and whatever relational
//! store backs a deployment; each component receives its store as an
//! injected trait object, so tests substitute [`MemoryStore`] without
//! touching call sites.

mod error;
mod memory;
mod ports;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use ports::{
    ConfigStore, OrderStore, PendingSignalFilter, PendingSignalStore, PositionStore, SignalStore,
    StrategyStore,
};
