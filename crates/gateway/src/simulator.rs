//! Simulated exchange adapter.
//!
//! Paper implementation of [`ExchangeGateway`]: prices and balances live in
//! in-memory tables, market and limit orders fill immediately and fully at
//! the table price (or the limit price), and failures can be injected to
//! exercise the engine's error paths. Balances are not debited by fills;
//! tests set them explicitly.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use hermes_core::{OrderStatus, Side};

use crate::error::{GatewayError, GatewayResult};
use crate::messages::{Balance, GatewayFill, GatewayOrderRequest, OrderAck};
use crate::port::ExchangeGateway;

pub struct SimulatedExchange {
    prices: DashMap<String, Decimal>,
    balances: DashMap<String, Balance>,
    leverage: DashMap<String, u32>,
    /// Errors returned by upcoming order placements, oldest first
    injected_failures: Mutex<VecDeque<GatewayError>>,
    order_seq: AtomicU64,
    /// Taker fee charged on notional, in the quote asset
    fee_rate: Decimal,
    quote_asset: String,
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
            balances: DashMap::new(),
            leverage: DashMap::new(),
            injected_failures: Mutex::new(VecDeque::new()),
            order_seq: AtomicU64::new(1),
            fee_rate: dec!(0.001),
            quote_asset: "USDT".to_string(),
        }
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.to_string(), price);
    }

    pub fn set_balance(&self, asset: &str, free: Decimal) {
        self.balances
            .insert(asset.to_string(), Balance::new(free, Decimal::ZERO));
    }

    /// Queue an error for the next order placement.
    pub fn inject_order_failure(&self, error: GatewayError) {
        self.injected_failures
            .lock()
            .expect("failure queue poisoned")
            .push_back(error);
    }

    /// Leverage last applied via `set_leverage`, if any.
    pub fn leverage_for(&self, symbol: &str) -> Option<u32> {
        self.leverage.get(symbol).map(|v| *v)
    }

    fn next_order_id(&self) -> String {
        format!("sim-{}", self.order_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn take_injected_failure(&self) -> Option<GatewayError> {
        self.injected_failures
            .lock()
            .expect("failure queue poisoned")
            .pop_front()
    }

    fn fill(&self, request: &GatewayOrderRequest, price: Decimal) -> OrderAck {
        let commission = request.quantity * price * self.fee_rate;
        let exchange_order_id = self.next_order_id();
        info!(
            "[SIM] filled {} {} {} @ {} (order {})",
            request.side.as_str(),
            request.quantity,
            request.symbol,
            price,
            exchange_order_id
        );
        OrderAck {
            exchange_order_id,
            status: OrderStatus::Filled,
            executed_quantity: request.quantity,
            avg_fill_price: Some(price),
            commission,
            commission_asset: Some(self.quote_asset.clone()),
            fills: vec![GatewayFill {
                price,
                quantity: request.quantity,
                commission,
                commission_asset: self.quote_asset.clone(),
            }],
        }
    }

    fn place(&self, request: &GatewayOrderRequest, price: Decimal) -> GatewayResult<OrderAck> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        if request.quantity <= Decimal::ZERO {
            return Err(GatewayError::InvalidRequest(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }
        Ok(self.fill(request, price))
    }
}

impl Default for SimulatedExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeGateway for SimulatedExchange {
    async fn get_price(&self, symbol: &str) -> GatewayResult<Decimal> {
        self.prices
            .get(symbol)
            .map(|p| *p)
            .ok_or_else(|| GatewayError::UnknownSymbol(symbol.to_string()))
    }

    async fn get_balance(&self, asset: &str) -> GatewayResult<Balance> {
        Ok(self
            .balances
            .get(asset)
            .map(|b| *b)
            .unwrap_or(Balance::new(Decimal::ZERO, Decimal::ZERO)))
    }

    async fn place_market_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        let price = self.get_price(&request.symbol).await?;
        self.place(request, price)
    }

    async fn place_limit_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        // Price presence is the caller's contract for limit orders.
        let price = request.price.ok_or_else(|| {
            GatewayError::InvalidRequest("limit order without a price".to_string())
        })?;
        // The symbol must still be known, as on a real venue.
        self.get_price(&request.symbol).await?;
        self.place(request, price)
    }

    async fn cancel_order(&self, symbol: &str, exchange_order_id: &str) -> GatewayResult<()> {
        debug!("[SIM] cancel {exchange_order_id} on {symbol}");
        Ok(())
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> GatewayResult<()> {
        if leverage == 0 {
            return Err(GatewayError::InvalidRequest(
                "leverage must be at least 1".to_string(),
            ));
        }
        self.leverage.insert(symbol.to_string(), leverage);
        Ok(())
    }
}
