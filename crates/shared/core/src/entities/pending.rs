use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signal::{OrderKind, SignalAction, SignalRecord};

/// Lifecycle of a manually-reviewed signal.
///
/// `Pending` is the only state with outgoing transitions; the other three
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
    Failed,
}

impl PendingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PendingStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// A manual-strategy signal parked until a human decides.
///
/// Symbol/action/kind/price/quantity are denormalized from the originating
/// signal so reviewers can act on the row without a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignal {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub signal_id: Uuid,
    pub symbol: String,
    pub action: SignalAction,
    pub order_kind: OrderKind,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    /// Original alert body, kept verbatim for the reviewer
    pub payload: serde_json::Value,
    pub status: PendingStatus,
    pub error: Option<String>,
    /// Order produced by an approved execution
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

impl PendingSignal {
    /// Park a signal routed to a manual strategy.
    pub fn from_signal(signal: &SignalRecord, strategy_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_id,
            signal_id: signal.id,
            symbol: signal.symbol.clone(),
            action: signal.action,
            order_kind: signal.order_kind,
            price: signal.price,
            quantity: signal.quantity,
            payload: signal.raw_payload.clone(),
            status: PendingStatus::Pending,
            error: None,
            order_id: None,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }
}
