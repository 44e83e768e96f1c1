use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the inbound alert asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    /// Open or extend exposure
    Buy,
    /// Reduce exposure or (leveraged venues) open a short
    Sell,
    /// Close the open position for the symbol
    Close,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Close => "close",
        }
    }
}

/// How the resulting order should be priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Execute at current market price
    Market,
    /// Execute at the supplied price or better
    Limit,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
        }
    }
}

/// One inbound trading alert, as persisted.
///
/// Immutable once stored except for the processed/error/order-reference
/// fields, which are resolved exactly once by whichever component settles
/// the signal's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: Uuid,
    pub action: SignalAction,
    pub symbol: String,
    pub order_kind: OrderKind,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    /// Strategy name as supplied by the alert sender
    pub strategy_name: Option<String>,
    /// Original alert body, kept verbatim for audit
    pub raw_payload: serde_json::Value,
    /// Resolved routing strategy, if any
    pub strategy_id: Option<Uuid>,
    pub processed: bool,
    /// Order produced by this signal, if execution got that far
    pub order_id: Option<Uuid>,
    pub error: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl SignalRecord {
    /// Fingerprint used for duplicate suppression
    pub fn fingerprint(action: SignalAction, symbol: &str, order_kind: OrderKind) -> String {
        format!("{}:{}:{}", action.as_str(), symbol, order_kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_price_and_quantity() {
        let fp = SignalRecord::fingerprint(SignalAction::Buy, "BTCUSDT", OrderKind::Market);
        assert_eq!(fp, "buy:BTCUSDT:market");
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SignalAction::Close).unwrap(),
            "\"close\""
        );
        assert_eq!(
            serde_json::from_str::<OrderKind>("\"limit\"").unwrap(),
            OrderKind::Limit
        );
    }
}
