//! Human review of signals routed to manual strategies.
//!
//! `Pending` is the only state with outgoing transitions. Approve and
//! reject are idempotent against repeated clicks: a row already decided is
//! left untouched.

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use hermes_core::{PendingSignal, PendingStatus, SignalRecord};
use hermes_store::{
    PendingSignalFilter, PendingSignalStore, SignalStore, StoreError, StrategyStore,
};

use crate::error::Result;
use crate::execution::ExecutionEngine;

pub struct PendingWorkflow {
    pendings: Arc<dyn PendingSignalStore>,
    signals: Arc<dyn SignalStore>,
    strategies: Arc<dyn StrategyStore>,
    execution: Arc<ExecutionEngine>,
}

impl PendingWorkflow {
    pub fn new(
        pendings: Arc<dyn PendingSignalStore>,
        signals: Arc<dyn SignalStore>,
        strategies: Arc<dyn StrategyStore>,
        execution: Arc<ExecutionEngine>,
    ) -> Self {
        Self {
            pendings,
            signals,
            strategies,
            execution,
        }
    }

    /// Park a signal routed to a manual strategy.
    pub async fn create_from_signal(
        &self,
        signal: &SignalRecord,
        strategy_id: Uuid,
    ) -> Result<PendingSignal> {
        let pending = PendingSignal::from_signal(signal, strategy_id);
        self.pendings.insert(&pending).await?;
        info!(
            "[PENDING] parked {} {} as pending signal {}",
            signal.action.as_str(),
            signal.symbol,
            pending.id
        );
        Ok(pending)
    }

    /// Approve a pending signal and execute it with the trading-enabled
    /// check bypassed. Returns the order id, or `None` when the row was
    /// already decided. Execution failure moves the row to `Failed`; it
    /// never returns to `Pending`.
    pub async fn approve(&self, id: Uuid, reviewer: &str) -> Result<Option<Uuid>> {
        let Some(pending) = self.pendings.get(id).await? else {
            return Err(StoreError::not_found("pending signal", id).into());
        };

        if !self
            .pendings
            .transition_from_pending(id, PendingStatus::Approved, reviewer)
            .await?
        {
            info!(
                "[PENDING] approve of {id} ignored, already {}",
                pending.status.as_str()
            );
            return Ok(None);
        }

        let Some(signal) = self.signals.get(pending.signal_id).await? else {
            let message = format!("signal {} missing for pending {id}", pending.signal_id);
            self.pendings.mark_failed(id, &message).await?;
            return Err(StoreError::not_found("signal", pending.signal_id).into());
        };
        let strategy = self.strategies.get(pending.strategy_id).await?;

        match self
            .execution
            .execute_from_signal(&signal, strategy.as_ref(), true, true)
            .await
        {
            Ok(order_id) => {
                self.pendings.attach_order(id, order_id).await?;
                info!("[PENDING] {id} approved by {reviewer}, order {order_id}");
                Ok(Some(order_id))
            }
            Err(err) => {
                warn!("[PENDING] execution of approved {id} failed: {err}");
                self.pendings.mark_failed(id, &err.to_string()).await?;
                Err(err)
            }
        }
    }

    /// Reject a pending signal. Never touches the exchange. A no-op when
    /// the row was already decided.
    pub async fn reject(&self, id: Uuid, reviewer: &str) -> Result<bool> {
        if self.pendings.get(id).await?.is_none() {
            return Err(StoreError::not_found("pending signal", id).into());
        }

        let transitioned = self
            .pendings
            .transition_from_pending(id, PendingStatus::Rejected, reviewer)
            .await?;
        if transitioned {
            info!("[PENDING] {id} rejected by {reviewer}");
        } else {
            info!("[PENDING] reject of {id} ignored, already decided");
        }
        Ok(transitioned)
    }

    pub async fn list(&self, filter: PendingSignalFilter) -> Result<Vec<PendingSignal>> {
        self.pendings.list(filter).await.map_err(Into::into)
    }

    pub async fn count_pending(&self) -> Result<usize> {
        self.pendings.count_pending().await.map_err(Into::into)
    }
}
