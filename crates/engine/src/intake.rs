//! Inbound alert validation, deduplication and strategy routing.
//!
//! Every alert that clears authentication produces a signal row, including
//! duplicates and validation failures; a rejected signal is never silently
//! dropped.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use hermes_core::{
    DEFAULT_AUTOMATIC_STRATEGY, OrderKind, SignalAction, SignalRecord, Strategy, StrategyKind,
};
use hermes_store::{SignalStore, StrategyStore};

use crate::dedup::DedupCache;
use crate::error::{EngineError, Result};

/// One alert as received from the webhook, already parsed.
#[derive(Debug, Clone)]
pub struct InboundAlert {
    pub action: SignalAction,
    pub symbol: String,
    pub order_kind: OrderKind,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub strategy_name: Option<String>,
    /// Verbatim request body, kept for audit
    pub raw_payload: serde_json::Value,
}

/// What the intake tells the dispatcher about an accepted signal.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub signal_id: Uuid,
    pub strategy_id: Option<Uuid>,
    pub strategy_kind: Option<StrategyKind>,
    pub requires_approval: bool,
}

pub struct SignalIntake {
    signals: Arc<dyn SignalStore>,
    strategies: Arc<dyn StrategyStore>,
    dedup: Arc<DedupCache>,
}

impl SignalIntake {
    pub fn new(
        signals: Arc<dyn SignalStore>,
        strategies: Arc<dyn StrategyStore>,
        dedup: Arc<DedupCache>,
    ) -> Self {
        Self {
            signals,
            strategies,
            dedup,
        }
    }

    /// Deduplicate, validate and route one alert, persisting the signal row
    /// on every path.
    pub async fn submit(&self, alert: InboundAlert) -> Result<SubmitOutcome> {
        let fingerprint =
            SignalRecord::fingerprint(alert.action, &alert.symbol, alert.order_kind);
        if !self.dedup.check_and_record(&fingerprint) {
            let message = format!(
                "identical signal {fingerprint} received within {:?}",
                self.dedup.window()
            );
            warn!("[INTAKE] {message}");
            self.persist(&alert, None, Some(message.clone())).await?;
            return Err(EngineError::DuplicateSignal(message));
        }

        if let Err(message) = validate(&alert) {
            warn!("[INTAKE] rejected alert for {}: {message}", alert.symbol);
            self.persist(&alert, None, Some(message.clone())).await?;
            return Err(EngineError::Validation(message));
        }

        let strategy = self.resolve_strategy(alert.strategy_name.as_deref()).await?;
        let resolved = strategy.as_ref();
        let record = self
            .persist(&alert, resolved.map(|s| s.id), None)
            .await?;

        let requires_approval = resolved.is_some_and(Strategy::requires_approval);
        info!(
            "[INTAKE] accepted {} {} {} as signal {} (strategy {:?}, approval {})",
            alert.action.as_str(),
            alert.symbol,
            alert.order_kind.as_str(),
            record.id,
            resolved.map(|s| s.name.as_str()),
            requires_approval
        );

        Ok(SubmitOutcome {
            signal_id: record.id,
            strategy_id: resolved.map(|s| s.id),
            strategy_kind: resolved.map(|s| s.kind),
            requires_approval,
        })
    }

    /// Named strategy by exact match, falling back through the default
    /// automatic strategy to the first enabled automatic one. No match at
    /// all is treated downstream as automatic with no risk bypass.
    async fn resolve_strategy(&self, name: Option<&str>) -> Result<Option<Strategy>> {
        if let Some(name) = name {
            match self.strategies.find_by_name(name).await? {
                Some(strategy) if strategy.enabled => return Ok(Some(strategy)),
                Some(_) => {
                    warn!("[INTAKE] strategy {name:?} is disabled, falling back to default");
                }
                None => {
                    warn!("[INTAKE] unknown strategy {name:?}, falling back to default");
                }
            }
        }

        if let Some(default) = self
            .strategies
            .find_by_name(DEFAULT_AUTOMATIC_STRATEGY)
            .await?
            .filter(|s| s.enabled)
        {
            return Ok(Some(default));
        }

        self.strategies
            .first_enabled_automatic()
            .await
            .map_err(Into::into)
    }

    async fn persist(
        &self,
        alert: &InboundAlert,
        strategy_id: Option<Uuid>,
        error: Option<String>,
    ) -> Result<SignalRecord> {
        let now = Utc::now();
        let record = SignalRecord {
            id: Uuid::new_v4(),
            action: alert.action,
            symbol: alert.symbol.clone(),
            order_kind: alert.order_kind,
            price: alert.price,
            quantity: alert.quantity,
            stop_loss: alert.stop_loss,
            strategy_name: alert.strategy_name.clone(),
            raw_payload: alert.raw_payload.clone(),
            strategy_id,
            processed: error.is_some(),
            order_id: None,
            processed_at: error.as_ref().map(|_| now),
            error,
            received_at: now,
        };
        self.signals.insert(&record).await?;
        Ok(record)
    }
}

fn validate(alert: &InboundAlert) -> std::result::Result<(), String> {
    if alert.symbol.trim().is_empty() {
        return Err("symbol must not be empty".to_string());
    }

    if alert.order_kind == OrderKind::Limit && alert.price.is_none() {
        return Err("limit orders require a price".to_string());
    }

    // Close carries no sizing fields worth checking.
    if alert.action == SignalAction::Close {
        return Ok(());
    }

    for (field, value) in [
        ("price", alert.price),
        ("quantity", alert.quantity),
        ("stopLoss", alert.stop_loss),
    ] {
        if let Some(value) = value
            && value <= Decimal::ZERO
        {
            return Err(format!("{field} must be positive, got {value}"));
        }
    }

    Ok(())
}
