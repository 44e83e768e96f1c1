//! Order sizing and pre-trade risk gating.
//!
//! Thresholds are static defaults overridden by `ConfigStore` rows; every
//! check reads the current configuration, never a cached snapshot, so an
//! operator can tighten limits mid-session.

use std::sync::Arc;

use chrono::Utc;
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use hermes_core::SignalRecord;
use hermes_gateway::ExchangeGateway;
use hermes_store::{ConfigStore, PositionStore};

use crate::error::{EngineError, Result};

/// Static risk defaults; each field can be overridden at runtime through
/// the config store under the key of the same name.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub default_position_size_pct: Decimal,
    pub max_position_size_pct: Decimal,
    pub max_total_exposure_pct: Decimal,
    pub max_daily_loss: Decimal,
    /// Asset balances and notionals are denominated in
    pub quote_asset: String,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            default_position_size_pct: dec!(5),
            max_position_size_pct: dec!(10),
            max_total_exposure_pct: dec!(50),
            max_daily_loss: dec!(500),
            quote_asset: "USDT".to_string(),
        }
    }
}

/// Outcome of a limits check. The reason string is persisted verbatim on
/// the rejected order row.
#[derive(Debug, Clone)]
pub struct RiskVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl RiskVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct RiskEngine {
    config: Arc<dyn ConfigStore>,
    positions: Arc<dyn PositionStore>,
    gateway: Arc<dyn ExchangeGateway>,
    defaults: RiskLimits,
}

impl RiskEngine {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        positions: Arc<dyn PositionStore>,
        gateway: Arc<dyn ExchangeGateway>,
        defaults: RiskLimits,
    ) -> Self {
        Self {
            config,
            positions,
            gateway,
            defaults,
        }
    }

    /// Quantity for a signal: verbatim when the alert supplies one,
    /// otherwise sized as a percentage of the free quote balance at the
    /// reference price, floored to 8 decimal places.
    pub async fn size(&self, signal: &SignalRecord) -> Result<Decimal> {
        if let Some(quantity) = signal.quantity {
            return Ok(quantity);
        }

        let price = self.reference_price(signal).await?;
        if price <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "cannot size an order at non-positive price {price}"
            )));
        }

        let quote = self.quote_asset().await?;
        let balance = self.gateway.get_balance(&quote).await?;
        let pct = self
            .decimal_override(
                "default_position_size_pct",
                self.defaults.default_position_size_pct,
            )
            .await?;

        let quantity = balance.free * pct / dec!(100) / price;
        Ok(quantity.round_dp_with_strategy(8, RoundingStrategy::ToZero))
    }

    /// Gate checks in order: trading-enabled flag, per-order position size,
    /// total exposure across open positions, daily realized-loss cap,
    /// available balance. The first failing check decides the verdict.
    pub async fn check_limits(
        &self,
        signal: &SignalRecord,
        quantity: Decimal,
        bypass_enabled_check: bool,
    ) -> Result<RiskVerdict> {
        if !bypass_enabled_check && !self.trading_enabled().await? {
            return Ok(RiskVerdict::deny("trading is disabled"));
        }

        let price = self.reference_price(signal).await?;
        let quote = self.quote_asset().await?;
        let available = self.gateway.get_balance(&quote).await?.free;
        if available <= Decimal::ZERO {
            return Ok(RiskVerdict::deny(format!("no available {quote} balance")));
        }

        let notional = quantity * price;

        let max_position_pct = self
            .decimal_override("max_position_size_pct", self.defaults.max_position_size_pct)
            .await?;
        let position_pct = notional / available * dec!(100);
        if position_pct > max_position_pct {
            return Ok(RiskVerdict::deny(format!(
                "position size {}% of balance exceeds max {}%",
                position_pct.round_dp(4).normalize(),
                max_position_pct.normalize()
            )));
        }

        let max_exposure_pct = self
            .decimal_override(
                "max_total_exposure_pct",
                self.defaults.max_total_exposure_pct,
            )
            .await?;
        let mut exposure = notional;
        for position in self.positions.open_positions().await? {
            let mark = self.gateway.get_price(&position.symbol).await?;
            exposure += position.notional_at(mark);
        }
        let exposure_pct = exposure / available * dec!(100);
        if exposure_pct > max_exposure_pct {
            return Ok(RiskVerdict::deny(format!(
                "total exposure {}% of balance exceeds max {}%",
                exposure_pct.round_dp(4).normalize(),
                max_exposure_pct.normalize()
            )));
        }

        let max_daily_loss = self
            .decimal_override("max_daily_loss", self.defaults.max_daily_loss)
            .await?;
        let today_pnl = self
            .positions
            .realized_pnl_closed_on(Utc::now().date_naive())
            .await?;
        if today_pnl.abs() > max_daily_loss {
            return Ok(RiskVerdict::deny(format!(
                "daily loss {} exceeds max {}",
                today_pnl.abs().normalize(),
                max_daily_loss.normalize()
            )));
        }

        if notional > available {
            return Ok(RiskVerdict::deny(format!(
                "order notional {} exceeds available balance {}",
                notional.normalize(),
                available.normalize()
            )));
        }

        Ok(RiskVerdict::allow())
    }

    /// Signal price when supplied, else the live market price.
    async fn reference_price(&self, signal: &SignalRecord) -> Result<Decimal> {
        match signal.price {
            Some(price) => Ok(price),
            None => Ok(self.gateway.get_price(&signal.symbol).await?),
        }
    }

    async fn quote_asset(&self) -> Result<String> {
        Ok(self
            .config
            .get("quote_asset")
            .await?
            .unwrap_or_else(|| self.defaults.quote_asset.clone()))
    }

    async fn trading_enabled(&self) -> Result<bool> {
        match self.config.get("trading_enabled").await? {
            Some(raw) => match raw.parse::<bool>() {
                Ok(flag) => Ok(flag),
                Err(_) => {
                    warn!("[RISK] unparseable trading_enabled override {raw:?}, assuming enabled");
                    Ok(true)
                }
            },
            None => Ok(true),
        }
    }

    /// Config override parsed as a decimal; unparseable values fall back to
    /// the static default with a warning rather than blocking trading.
    async fn decimal_override(&self, key: &str, fallback: Decimal) -> Result<Decimal> {
        match self.config.get(key).await? {
            Some(raw) => match raw.parse::<Decimal>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!("[RISK] unparseable {key} override {raw:?}, using default {fallback}");
                    Ok(fallback)
                }
            },
            None => Ok(fallback),
        }
    }
}
