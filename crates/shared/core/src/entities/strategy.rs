use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the built-in fallback strategy used when an alert names nothing
/// (or names a strategy that is disabled/missing).
pub const DEFAULT_AUTOMATIC_STRATEGY: &str = "Default Automatic";

/// How signals routed to this strategy are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Execute immediately after risk checks
    Automatic,
    /// Park the signal until a human approves or rejects it
    Manual,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
        }
    }
}

/// Trading venue semantics for a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// Long-only cash market
    Spot,
    /// Margined market with leverage and two-sided positions
    Leveraged,
}

/// Named routing rule for inbound signals.
///
/// Strategies are created and edited by the admin surface; the engine only
/// reads them. A strategy with outstanding pending signals cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: Uuid,
    /// Unique name, matched exactly against the alert's strategy field
    pub name: String,
    pub kind: StrategyKind,
    pub enabled: bool,
    pub venue: VenueKind,
    /// Leverage multiple; meaningful only for leveraged venues
    pub leverage: u32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, kind: StrategyKind, venue: VenueKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            enabled: true,
            venue,
            leverage: 1,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.leverage = leverage;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Signals routed here wait for a human decision
    pub fn requires_approval(&self) -> bool {
        self.kind == StrategyKind::Manual
    }
}
