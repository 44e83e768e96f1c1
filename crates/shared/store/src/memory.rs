//! In-memory store.
//!
//! Backs tests and the simulated runner. Tables are `RwLock`-guarded maps;
//! every port the engine consumes is implemented on the same struct so one
//! instance can be shared as each of the trait objects.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use hermes_core::{
    OrderRecord, PendingSignal, PendingStatus, Position, SignalRecord, Strategy,
};

use crate::error::{StoreError, StoreResult};
use crate::ports::{
    ConfigStore, OrderStore, PendingSignalFilter, PendingSignalStore, PositionStore, SignalStore,
    StrategyStore,
};

#[derive(Default)]
pub struct MemoryStore {
    signals: RwLock<HashMap<Uuid, SignalRecord>>,
    strategies: RwLock<HashMap<Uuid, Strategy>>,
    pending: RwLock<HashMap<Uuid, PendingSignal>>,
    orders: RwLock<HashMap<Uuid, OrderRecord>>,
    positions: RwLock<HashMap<Uuid, Position>>,
    config: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn insert(&self, signal: &SignalRecord) -> StoreResult<()> {
        self.signals
            .write()
            .await
            .insert(signal.id, signal.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<SignalRecord>> {
        Ok(self.signals.read().await.get(&id).cloned())
    }

    async fn resolve(
        &self,
        id: Uuid,
        order_id: Option<Uuid>,
        error: Option<String>,
    ) -> StoreResult<()> {
        let mut signals = self.signals.write().await;
        let signal = signals.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "signal",
            id,
        })?;
        if signal.processed {
            return Err(StoreError::Conflict(format!(
                "signal {id} is already resolved"
            )));
        }
        signal.processed = true;
        signal.processed_at = Some(Utc::now());
        signal.order_id = order_id;
        signal.error = error;
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<SignalRecord>> {
        let mut rows: Vec<_> = self.signals.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl StrategyStore for MemoryStore {
    async fn insert(&self, strategy: &Strategy) -> StoreResult<()> {
        let mut strategies = self.strategies.write().await;
        if strategies.values().any(|s| s.name == strategy.name) {
            return Err(StoreError::Conflict(format!(
                "strategy name '{}' already exists",
                strategy.name
            )));
        }
        strategies.insert(strategy.id, strategy.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Strategy>> {
        Ok(self.strategies.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Strategy>> {
        Ok(self
            .strategies
            .read()
            .await
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn first_enabled_automatic(&self) -> StoreResult<Option<Strategy>> {
        let strategies = self.strategies.read().await;
        let mut candidates: Vec<_> = strategies
            .values()
            .filter(|s| s.enabled && s.kind == hermes_core::StrategyKind::Automatic)
            .collect();
        candidates.sort_by_key(|s| s.created_at);
        Ok(candidates.first().map(|s| (*s).clone()))
    }

    async fn list(&self) -> StoreResult<Vec<Strategy>> {
        let mut rows: Vec<_> = self.strategies.read().await.values().cloned().collect();
        rows.sort_by_key(|s| s.created_at);
        Ok(rows)
    }

    async fn update(&self, strategy: &Strategy) -> StoreResult<()> {
        let mut strategies = self.strategies.write().await;
        if !strategies.contains_key(&strategy.id) {
            return Err(StoreError::NotFound {
                entity: "strategy",
                id: strategy.id,
            });
        }
        strategies.insert(strategy.id, strategy.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let has_pending = self
            .pending
            .read()
            .await
            .values()
            .any(|p| p.strategy_id == id && p.status == PendingStatus::Pending);
        if has_pending {
            return Err(StoreError::Conflict(format!(
                "strategy {id} has pending signals"
            )));
        }
        self.strategies
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "strategy",
                id,
            })
    }
}

#[async_trait]
impl PendingSignalStore for MemoryStore {
    async fn insert(&self, row: &PendingSignal) -> StoreResult<()> {
        self.pending.write().await.insert(row.id, row.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<PendingSignal>> {
        Ok(self.pending.read().await.get(&id).cloned())
    }

    async fn transition_from_pending(
        &self,
        id: Uuid,
        to: PendingStatus,
        reviewer: &str,
    ) -> StoreResult<bool> {
        let mut pending = self.pending.write().await;
        let row = pending.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "pending signal",
            id,
        })?;
        if row.status != PendingStatus::Pending {
            return Ok(false);
        }
        row.status = to;
        row.reviewed_at = Some(Utc::now());
        row.reviewed_by = Some(reviewer.to_string());
        Ok(true)
    }

    async fn attach_order(&self, id: Uuid, order_id: Uuid) -> StoreResult<()> {
        let mut pending = self.pending.write().await;
        let row = pending.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "pending signal",
            id,
        })?;
        if row.status != PendingStatus::Approved {
            return Err(StoreError::Conflict(format!(
                "pending signal {id} is {}, not approved",
                row.status.as_str()
            )));
        }
        row.order_id = Some(order_id);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> StoreResult<()> {
        let mut pending = self.pending.write().await;
        let row = pending.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "pending signal",
            id,
        })?;
        if row.status != PendingStatus::Approved {
            return Err(StoreError::Conflict(format!(
                "pending signal {id} is {}, not approved",
                row.status.as_str()
            )));
        }
        row.status = PendingStatus::Failed;
        row.error = Some(error.to_string());
        Ok(())
    }

    async fn list(&self, filter: PendingSignalFilter) -> StoreResult<Vec<PendingSignal>> {
        let mut rows: Vec<_> = self
            .pending
            .read()
            .await
            .values()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| filter.strategy_id.is_none_or(|id| p.strategy_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_pending(&self) -> StoreResult<usize> {
        Ok(self
            .pending
            .read()
            .await
            .values()
            .filter(|p| p.status == PendingStatus::Pending)
            .count())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &OrderRecord) -> StoreResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<OrderRecord>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<OrderRecord>> {
        let mut rows: Vec<_> = self.orders.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn insert(&self, position: &Position) -> StoreResult<()> {
        self.positions
            .write()
            .await
            .insert(position.id, position.clone());
        Ok(())
    }

    async fn update(&self, position: &Position) -> StoreResult<()> {
        let mut positions = self.positions.write().await;
        if !positions.contains_key(&position.id) {
            return Err(StoreError::NotFound {
                entity: "position",
                id: position.id,
            });
        }
        positions.insert(position.id, position.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Position>> {
        Ok(self.positions.read().await.get(&id).cloned())
    }

    async fn open_for_symbol(&self, symbol: &str) -> StoreResult<Option<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .values()
            .find(|p| p.is_open() && p.symbol == symbol)
            .cloned())
    }

    async fn open_positions(&self) -> StoreResult<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .values()
            .filter(|p| p.is_open())
            .cloned()
            .collect())
    }

    async fn realized_pnl_closed_on(&self, day: NaiveDate) -> StoreResult<Decimal> {
        Ok(self
            .positions
            .read()
            .await
            .values()
            .filter(|p| p.closed_at.is_some_and(|t| t.date_naive() == day))
            .map(|p| p.realized_pnl)
            .sum())
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<Position>> {
        let mut rows: Vec<_> = self.positions.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.config.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.config
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn all(&self) -> StoreResult<Vec<(String, String)>> {
        let mut rows: Vec<_> = self
            .config
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        rows.sort();
        Ok(rows)
    }
}
