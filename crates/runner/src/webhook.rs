//! Webhook wire types and the API error surface.
//!
//! The HTTP framework itself is out of scope; these are the bodies and
//! status codes a thin handler maps onto. Authentication is the only
//! failure that rejects a call before a signal row exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use hermes_core::{OrderKind, SignalAction};
use hermes_engine::{EngineError, InboundAlert, SubmitOutcome};

/// Inbound alert body as the sender posts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub action: SignalAction,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default = "default_order_type")]
    pub order_type: OrderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    /// Free-text note from the alert sender, kept only in the raw payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_order_type() -> OrderKind {
    OrderKind::Market
}

impl AlertRequest {
    /// Intake input, with the request body itself as the audit payload.
    pub fn into_alert(self) -> InboundAlert {
        let raw_payload = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);
        InboundAlert {
            action: self.action,
            symbol: self.symbol,
            order_kind: self.order_type,
            price: self.price,
            quantity: self.quantity,
            stop_loss: self.stop_loss,
            strategy_name: self.strategy,
            raw_payload,
        }
    }
}

/// Acceptance acknowledgment. Success means "accepted for processing",
/// not "order placed"; callers poll order/position state for the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub success: bool,
    pub message: String,
    pub signal_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<String>,
    pub requires_approval: bool,
}

impl AlertResponse {
    pub fn accepted(outcome: &SubmitOutcome) -> Self {
        Self {
            success: true,
            message: "Signal accepted for processing".to_string(),
            signal_id: outcome.signal_id,
            strategy_type: outcome.strategy_kind.map(|k| k.as_str().to_string()),
            requires_approval: outcome.requires_approval,
        }
    }
}

/// Failures surfaced to the webhook caller.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate signal: {0}")]
    DuplicateSignal(String),

    /// Dispatch queue is full; backpressure, try again later.
    #[error("Service is busy, try again later")]
    Busy,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Authentication(_) => 401,
            ApiError::Validation(_) => 400,
            ApiError::DuplicateSignal(_) => 429,
            ApiError::Busy => 503,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Authentication(_) => "AuthenticationError",
            ApiError::Validation(_) => "ValidationError",
            ApiError::DuplicateSignal(_) => "DuplicateSignalError",
            ApiError::Busy => "ServiceBusyError",
            ApiError::Internal(_) => "InternalError",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                kind: self.kind().to_string(),
                message: self.to_string(),
                details: None,
            },
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => ApiError::Validation(message),
            EngineError::DuplicateSignal(message) => ApiError::DuplicateSignal(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
