//! Wire types exchanged with the gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hermes_core::{OrderStatus, Side};

/// Free and locked balance for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(free: Decimal, locked: Decimal) -> Self {
        Self { free, locked }
    }

    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// Order submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderRequest {
    /// Client-assigned order ID for correlation
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Required for limit orders
    pub price: Option<Decimal>,
}

impl GatewayOrderRequest {
    /// Build a market order request
    pub fn market(
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            price: None,
        }
    }

    /// Build a limit order request
    pub fn limit(
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            price: Some(price),
        }
    }
}

/// One fill reported in an ack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFill {
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
}

/// What the exchange returned for a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned identifier
    pub exchange_order_id: String,
    pub status: OrderStatus,
    pub executed_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub commission: Decimal,
    pub commission_asset: Option<String>,
    pub fills: Vec<GatewayFill>,
}

impl OrderAck {
    /// Quantity-weighted average price over the ack's fills
    pub fn fill_price_from_fills(&self) -> Option<Decimal> {
        let total_qty: Decimal = self.fills.iter().map(|f| f.quantity).sum();
        if total_qty.is_zero() {
            return None;
        }
        let notional: Decimal = self.fills.iter().map(|f| f.price * f.quantity).sum();
        Some(notional / total_qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn avg_price_weights_by_quantity() {
        let ack = OrderAck {
            exchange_order_id: "1".into(),
            status: OrderStatus::Filled,
            executed_quantity: dec!(3),
            avg_fill_price: None,
            commission: dec!(0.003),
            commission_asset: Some("BTC".into()),
            fills: vec![
                GatewayFill {
                    price: dec!(100),
                    quantity: dec!(1),
                    commission: dec!(0.001),
                    commission_asset: "BTC".into(),
                },
                GatewayFill {
                    price: dec!(103),
                    quantity: dec!(2),
                    commission: dec!(0.002),
                    commission_asset: "BTC".into(),
                },
            ],
        };
        assert_eq!(ack.fill_price_from_fills(), Some(dec!(102)));
    }
}
