//! Turns a routed signal into an exchange order with a complete audit
//! trail.
//!
//! Every execution attempt leaves exactly one order row, whether it was
//! risk-rejected, refused by the exchange, or filled. The single exception
//! is a gateway failure during a manually approved signal, where the
//! pending row carries the failure instead of a rejected order. The
//! originating signal is resolved exactly once on every path.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use hermes_core::{
    OrderKind, OrderRecord, OrderType, Side, SignalAction, SignalRecord, Strategy, VenueKind,
};
use hermes_gateway::{ExchangeGateway, GatewayError, GatewayOrderRequest, OrderAck};
use hermes_store::{OrderStore, SignalStore};

use crate::error::{EngineError, Result};
use crate::ledger::PositionLedger;
use crate::risk::RiskEngine;

pub struct ExecutionEngine {
    signals: Arc<dyn SignalStore>,
    orders: Arc<dyn OrderStore>,
    risk: Arc<RiskEngine>,
    ledger: Arc<PositionLedger>,
    gateway: Arc<dyn ExchangeGateway>,
}

impl ExecutionEngine {
    pub fn new(
        signals: Arc<dyn SignalStore>,
        orders: Arc<dyn OrderStore>,
        risk: Arc<RiskEngine>,
        ledger: Arc<PositionLedger>,
        gateway: Arc<dyn ExchangeGateway>,
    ) -> Self {
        Self {
            signals,
            orders,
            risk,
            ledger,
            gateway,
        }
    }

    /// Execute one routed signal end to end: size, gate, place, record,
    /// book. `bypass_enabled_check` and `is_manual_approval` are both true
    /// only when a human approved the signal through the pending workflow.
    pub async fn execute_from_signal(
        &self,
        signal: &SignalRecord,
        strategy: Option<&Strategy>,
        bypass_enabled_check: bool,
        is_manual_approval: bool,
    ) -> Result<Uuid> {
        let venue = strategy.map_or(VenueKind::Spot, |s| s.venue);
        let leverage = strategy.map_or(1, |s| s.leverage);
        let strategy_id = strategy.map(|s| s.id);
        let side = match signal.action {
            SignalAction::Buy => Side::Buy,
            SignalAction::Sell | SignalAction::Close => Side::Sell,
        };
        let order_type = match signal.order_kind {
            OrderKind::Market => OrderType::Market,
            OrderKind::Limit => OrderType::Limit,
        };

        let quantity = match self.risk.size(signal).await {
            Ok(quantity) => quantity,
            Err(EngineError::Gateway(err)) => {
                // Sizing never reached the risk gate; audit with what the
                // alert carried.
                let quantity = signal.quantity.unwrap_or(Decimal::ZERO);
                return self
                    .settle_gateway_failure(
                        signal,
                        strategy_id,
                        side,
                        order_type,
                        quantity,
                        venue,
                        false,
                        is_manual_approval,
                        err,
                    )
                    .await;
            }
            Err(other) => return Err(other),
        };

        let verdict = match self
            .risk
            .check_limits(signal, quantity, bypass_enabled_check)
            .await
        {
            Ok(verdict) => verdict,
            Err(EngineError::Gateway(err)) => {
                return self
                    .settle_gateway_failure(
                        signal,
                        strategy_id,
                        side,
                        order_type,
                        quantity,
                        venue,
                        false,
                        is_manual_approval,
                        err,
                    )
                    .await;
            }
            Err(other) => return Err(other),
        };

        if !verdict.allowed {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "risk check failed".to_string());
            warn!(
                "[EXEC] risk rejected {} {} for signal {}: {reason}",
                side.as_str(),
                signal.symbol,
                signal.id
            );
            let row = OrderRecord::rejected(
                signal.symbol.clone(),
                side,
                order_type,
                quantity,
                signal.price,
                strategy_id,
                false,
                venue,
                reason.clone(),
            );
            self.orders.insert(&row).await?;
            self.signals
                .resolve(signal.id, Some(row.id), Some(reason.clone()))
                .await?;
            return Err(EngineError::RiskRejected { reason });
        }

        if venue == VenueKind::Leveraged
            && let Err(err) = self.gateway.set_leverage(&signal.symbol, leverage).await
        {
            return self
                .settle_gateway_failure(
                    signal,
                    strategy_id,
                    side,
                    order_type,
                    quantity,
                    venue,
                    true,
                    is_manual_approval,
                    err,
                )
                .await;
        }

        let order_id = Uuid::new_v4();
        let client_id = order_id.to_string();
        let placement = match signal.order_kind {
            OrderKind::Market => {
                let request =
                    GatewayOrderRequest::market(client_id, signal.symbol.clone(), side, quantity);
                self.gateway.place_market_order(&request).await
            }
            OrderKind::Limit => match signal.price {
                Some(price) => {
                    let request = GatewayOrderRequest::limit(
                        client_id,
                        signal.symbol.clone(),
                        side,
                        quantity,
                        price,
                    );
                    self.gateway.place_limit_order(&request).await
                }
                None => Err(GatewayError::InvalidRequest(
                    "limit order without a price".to_string(),
                )),
            },
        };

        let ack = match placement {
            Ok(ack) => ack,
            Err(err) => {
                return self
                    .settle_gateway_failure(
                        signal,
                        strategy_id,
                        side,
                        order_type,
                        quantity,
                        venue,
                        true,
                        is_manual_approval,
                        err,
                    )
                    .await;
            }
        };

        let row = self.record_from_ack(
            order_id,
            signal,
            strategy_id,
            side,
            order_type,
            quantity,
            venue,
            &ack,
        );
        self.orders.insert(&row).await?;
        self.signals.resolve(signal.id, Some(row.id), None).await?;
        info!(
            "[EXEC] placed {} {} {} as order {} ({:?})",
            side.as_str(),
            quantity,
            signal.symbol,
            row.id,
            row.status
        );

        if row.is_filled()
            && let Some(fill_price) = row.avg_fill_price
        {
            // The exchange order already succeeded; bookkeeping failures
            // are logged, never unwound.
            if let Err(err) = self
                .ledger
                .on_fill(
                    row.id,
                    side,
                    &signal.symbol,
                    row.filled_quantity,
                    fill_price,
                    venue,
                    leverage,
                )
                .await
            {
                error!(
                    "[EXEC] position bookkeeping failed for order {}: {err}",
                    row.id
                );
            }
        }

        Ok(row.id)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_from_ack(
        &self,
        order_id: Uuid,
        signal: &SignalRecord,
        strategy_id: Option<Uuid>,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        venue: VenueKind,
        ack: &OrderAck,
    ) -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            id: order_id,
            exchange_order_id: Some(ack.exchange_order_id.clone()),
            symbol: signal.symbol.clone(),
            side,
            order_type,
            quantity,
            price: signal.price,
            stop_price: signal.stop_loss,
            status: ack.status,
            filled_quantity: ack.executed_quantity,
            avg_fill_price: ack.avg_fill_price.or_else(|| ack.fill_price_from_fills()),
            commission: ack.commission,
            commission_asset: ack.commission_asset.clone(),
            strategy_id,
            risk_passed: true,
            venue,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Settle a signal whose gateway interaction failed. Automatic signals
    /// still get a rejected order row for the audit trail; a manually
    /// approved signal gets none, since the pending row records the failure
    /// instead.
    #[allow(clippy::too_many_arguments)]
    async fn settle_gateway_failure(
        &self,
        signal: &SignalRecord,
        strategy_id: Option<Uuid>,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        venue: VenueKind,
        risk_passed: bool,
        is_manual_approval: bool,
        err: GatewayError,
    ) -> Result<Uuid> {
        warn!(
            "[EXEC] gateway failure for signal {} ({} {}): {err}",
            signal.id,
            side.as_str(),
            signal.symbol
        );

        if is_manual_approval {
            self.signals
                .resolve(signal.id, None, Some(err.to_string()))
                .await?;
            return Err(err.into());
        }

        let row = OrderRecord::rejected(
            signal.symbol.clone(),
            side,
            order_type,
            quantity,
            signal.price,
            strategy_id,
            risk_passed,
            venue,
            err.to_string(),
        );
        self.orders.insert(&row).await?;
        self.signals
            .resolve(signal.id, Some(row.id), Some(err.to_string()))
            .await?;
        Err(err.into())
    }
}
