//! Bounded-retry decorator for gateway calls.
//!
//! Transient failures (transport, 5xx-class, rate limiting) are retried up
//! to the policy's attempt budget with a doubling backoff. Terminal
//! failures return immediately. There is no caller-supplied timeout: a
//! gateway call that hangs blocks its signal's background task.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use rust_decimal::Decimal;

use crate::error::{GatewayError, GatewayResult};
use crate::messages::{Balance, GatewayOrderRequest, OrderAck};
use crate::port::ExchangeGateway;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Wraps any gateway with the retry policy.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: ExchangeGateway> RetryingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, what: &str, op: F) -> GatewayResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let mut delay = self.policy.base_delay;
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    warn!(
                        "[GATEWAY] {what} attempt {attempt}/{} failed, retrying in {:?}: {err}",
                        self.policy.max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<G: ExchangeGateway> ExchangeGateway for RetryingGateway<G> {
    async fn get_price(&self, symbol: &str) -> GatewayResult<Decimal> {
        self.run("get_price", || self.inner.get_price(symbol)).await
    }

    async fn get_balance(&self, asset: &str) -> GatewayResult<Balance> {
        self.run("get_balance", || self.inner.get_balance(asset))
            .await
    }

    async fn place_market_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        self.run("place_market_order", || {
            self.inner.place_market_order(request)
        })
        .await
    }

    async fn place_limit_order(&self, request: &GatewayOrderRequest) -> GatewayResult<OrderAck> {
        self.run("place_limit_order", || self.inner.place_limit_order(request))
            .await
    }

    async fn cancel_order(&self, symbol: &str, exchange_order_id: &str) -> GatewayResult<()> {
        self.run("cancel_order", || {
            self.inner.cancel_order(symbol, exchange_order_id)
        })
        .await
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> GatewayResult<()> {
        self.run("set_leverage", || self.inner.set_leverage(symbol, leverage))
            .await
    }
}
