//! The Exchange Gateway port.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::GatewayResult;
use crate::messages::{Balance, GatewayOrderRequest, OrderAck};

/// Boundary between the execution engine and exchange connectivity.
///
/// Implementations own signing, throttling and transport; the engine only
/// sees this contract. `set_leverage` must be called before placing orders
/// on a leveraged venue.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Last traded price for a symbol.
    async fn get_price(&self, symbol: &str) -> GatewayResult<Decimal>;

    /// Free/locked balance for an asset.
    async fn get_balance(&self, asset: &str) -> GatewayResult<Balance>;

    async fn place_market_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck>;

    async fn place_limit_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck>;

    async fn cancel_order(&self, symbol: &str, exchange_order_id: &str) -> GatewayResult<()>;

    /// Leveraged venues only; no-op on spot adapters.
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> GatewayResult<()>;
}

/// Shared handles delegate, so an adapter can be kept for direct access
/// while also being wrapped in a decorator.
#[async_trait]
impl<G: ExchangeGateway + ?Sized> ExchangeGateway for Arc<G> {
    async fn get_price(&self, symbol: &str) -> GatewayResult<Decimal> {
        (**self).get_price(symbol).await
    }

    async fn get_balance(&self, asset: &str) -> GatewayResult<Balance> {
        (**self).get_balance(asset).await
    }

    async fn place_market_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        (**self).place_market_order(request).await
    }

    async fn place_limit_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        (**self).place_limit_order(request).await
    }

    async fn cancel_order(&self, symbol: &str, exchange_order_id: &str) -> GatewayResult<()> {
        (**self).cancel_order(symbol, exchange_order_id).await
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> GatewayResult<()> {
        (**self).set_leverage(symbol, leverage).await
    }
}
