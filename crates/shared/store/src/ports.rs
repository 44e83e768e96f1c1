//! Persistence ports, one per entity plus the derived aggregate queries.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use hermes_core::{
    OrderRecord, PendingSignal, PendingStatus, Position, SignalRecord, Strategy,
};

use crate::error::StoreResult;

/// Inbound signals (the intake's audit trail).
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn insert(&self, signal: &SignalRecord) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<SignalRecord>>;

    /// Settle a signal's outcome: processed flag, order reference and error
    /// text, set exactly once. A second resolve is a conflict.
    async fn resolve(
        &self,
        id: Uuid,
        order_id: Option<Uuid>,
        error: Option<String>,
    ) -> StoreResult<()>;

    /// Most recent first.
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<SignalRecord>>;
}

/// Routing strategies. Written by the admin surface, read-only to the engine.
#[async_trait]
pub trait StrategyStore: Send + Sync {
    async fn insert(&self, strategy: &Strategy) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Strategy>>;

    /// Exact-name lookup.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Strategy>>;

    /// First enabled strategy of automatic kind, by creation time.
    async fn first_enabled_automatic(&self) -> StoreResult<Option<Strategy>>;

    async fn list(&self) -> StoreResult<Vec<Strategy>>;

    async fn update(&self, strategy: &Strategy) -> StoreResult<()>;

    /// Refuses to delete a strategy that still has pending signals.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Filter for pending-signal listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingSignalFilter {
    pub status: Option<PendingStatus>,
    pub strategy_id: Option<Uuid>,
}

/// Manual-strategy signals awaiting (or past) review.
#[async_trait]
pub trait PendingSignalStore: Send + Sync {
    async fn insert(&self, pending: &PendingSignal) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<PendingSignal>>;

    /// Compare-and-set from `Pending`. Returns false (and changes nothing)
    /// if the row is already in a terminal state.
    async fn transition_from_pending(
        &self,
        id: Uuid,
        to: PendingStatus,
        reviewer: &str,
    ) -> StoreResult<bool>;

    /// Attach the order produced by an approved execution.
    /// Only valid while the row is `Approved`.
    async fn attach_order(&self, id: Uuid, order_id: Uuid) -> StoreResult<()>;

    /// Move an `Approved` row to `Failed` with the execution error.
    async fn mark_failed(&self, id: Uuid, error: &str) -> StoreResult<()>;

    async fn list(&self, filter: PendingSignalFilter) -> StoreResult<Vec<PendingSignal>>;

    /// Cheap derived count for UI badges.
    async fn count_pending(&self) -> StoreResult<usize>;
}

/// Execution audit log: one row per attempt, successful or not.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &OrderRecord) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<OrderRecord>>;

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<OrderRecord>>;
}

/// Position ledger rows plus the aggregates the risk engine needs.
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn insert(&self, position: &Position) -> StoreResult<()>;

    async fn update(&self, position: &Position) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Position>>;

    /// The single open position for a symbol, if any.
    async fn open_for_symbol(&self, symbol: &str) -> StoreResult<Option<Position>>;

    async fn open_positions(&self) -> StoreResult<Vec<Position>>;

    /// Realized P&L summed over positions closed on the given UTC day.
    async fn realized_pnl_closed_on(&self, day: NaiveDate) -> StoreResult<Decimal>;

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<Position>>;
}

/// Runtime key/value configuration overrides (risk thresholds and friends).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn all(&self) -> StoreResult<Vec<(String, String)>>;
}
