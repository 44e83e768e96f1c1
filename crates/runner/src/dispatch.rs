//! Accept, enqueue, ack, process.
//!
//! The webhook handler authenticates and runs intake synchronously so the
//! caller learns the signal id and routing; execution happens on a worker
//! draining a bounded queue. A full queue is surfaced to the caller as
//! backpressure instead of silently growing.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use hermes_engine::{EngineError, ExecutionEngine, PendingWorkflow, SignalIntake};
use hermes_store::{SignalStore, StrategyStore};

use crate::webhook::{AlertRequest, AlertResponse, ApiError};

#[derive(Debug, Clone, Copy)]
struct Job {
    signal_id: Uuid,
    strategy_id: Option<Uuid>,
    requires_approval: bool,
}

pub struct SignalDispatcher {
    token: String,
    intake: Arc<SignalIntake>,
    queue: mpsc::Sender<Job>,
    worker: JoinHandle<()>,
}

impl SignalDispatcher {
    pub fn new(
        token: impl Into<String>,
        capacity: usize,
        intake: Arc<SignalIntake>,
        execution: Arc<ExecutionEngine>,
        pending: Arc<PendingWorkflow>,
        signals: Arc<dyn SignalStore>,
        strategies: Arc<dyn StrategyStore>,
    ) -> Self {
        let (queue, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_worker(rx, execution, pending, signals, strategies));
        Self {
            token: token.into(),
            intake,
            queue,
            worker,
        }
    }

    /// One webhook call, end to end minus the HTTP framing: authenticate,
    /// run intake, enqueue for background execution, acknowledge.
    pub async fn handle_alert(
        &self,
        provided_token: Option<&str>,
        request: AlertRequest,
    ) -> Result<AlertResponse, ApiError> {
        // Rejected before any signal row exists.
        if provided_token != Some(self.token.as_str()) {
            return Err(ApiError::Authentication(
                "invalid or missing webhook token".to_string(),
            ));
        }

        let outcome = self.intake.submit(request.into_alert()).await?;

        let job = Job {
            signal_id: outcome.signal_id,
            strategy_id: outcome.strategy_id,
            requires_approval: outcome.requires_approval,
        };
        if self.queue.try_send(job).is_err() {
            warn!("[DISPATCH] queue full, refusing signal {}", outcome.signal_id);
            // The signal row stays unprocessed; the refusal is visible to
            // the caller rather than lost.
            return Err(ApiError::Busy);
        }

        Ok(AlertResponse::accepted(&outcome))
    }

    /// Close the queue and wait for the worker to drain it.
    pub async fn shutdown(self) {
        drop(self.queue);
        if let Err(err) = self.worker.await {
            error!("[DISPATCH] worker task panicked: {err}");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Job>,
    execution: Arc<ExecutionEngine>,
    pending: Arc<PendingWorkflow>,
    signals: Arc<dyn SignalStore>,
    strategies: Arc<dyn StrategyStore>,
) {
    while let Some(job) = rx.recv().await {
        // Per-signal isolation: one bad signal never stops the worker.
        if let Err(err) = process(&job, &execution, &pending, &signals, &strategies).await {
            match &err {
                EngineError::RiskRejected { .. }
                | EngineError::Gateway(_)
                | EngineError::Validation(_)
                | EngineError::DuplicateSignal(_) => {
                    // Expected outcomes, already persisted on their audit rows.
                    warn!("[DISPATCH] signal {} not executed: {err}", job.signal_id);
                }
                EngineError::Ledger(_) | EngineError::Store(_) => {
                    error!("[DISPATCH] signal {} processing failed: {err}", job.signal_id);
                }
            }
        }
    }
    info!("[DISPATCH] queue closed, worker stopping");
}

async fn process(
    job: &Job,
    execution: &ExecutionEngine,
    pending: &PendingWorkflow,
    signals: &Arc<dyn SignalStore>,
    strategies: &Arc<dyn StrategyStore>,
) -> Result<(), EngineError> {
    let Some(signal) = signals.get(job.signal_id).await? else {
        return Err(hermes_store::StoreError::not_found("signal", job.signal_id).into());
    };

    if job.requires_approval {
        let Some(strategy_id) = job.strategy_id else {
            return Err(EngineError::Validation(
                "approval-routed signal without a strategy".to_string(),
            ));
        };
        pending.create_from_signal(&signal, strategy_id).await?;
        return Ok(());
    }

    let strategy = match job.strategy_id {
        Some(id) => strategies.get(id).await?,
        None => None,
    };
    execution
        .execute_from_signal(&signal, strategy.as_ref(), false, false)
        .await?;
    Ok(())
}
