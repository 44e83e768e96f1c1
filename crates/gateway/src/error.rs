//! Gateway errors, split into transient and terminal classes.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network-level failure; worth retrying.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Exchange-side failure (5xx-class); worth retrying.
    #[error("Exchange error {code}: {message}")]
    Exchange { code: i64, message: String },

    /// Throttled by the exchange; worth retrying after a pause.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The request itself is wrong; retrying cannot help.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Not enough funds for the order; retrying cannot help.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: String, available: String },

    /// Credential mismatch; retrying cannot help.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl GatewayError {
    /// Transient failures get the bounded-retry treatment; validation-class
    /// and balance-class failures do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport(_)
                | GatewayError::Exchange { .. }
                | GatewayError::RateLimited(_)
        )
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(GatewayError::Transport("reset".into()).is_retryable());
        assert!(
            GatewayError::Exchange {
                code: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(!GatewayError::InvalidRequest("bad qty".into()).is_retryable());
        assert!(
            !GatewayError::InsufficientBalance {
                required: "100".into(),
                available: "50".into()
            }
            .is_retryable()
        );
    }
}
