mod order;
mod pending;
mod position;
mod signal;
mod strategy;

pub use order::{OrderRecord, OrderStatus, OrderType, Side};
pub use pending::{PendingSignal, PendingStatus};
pub use position::{Position, PositionSide, PositionStatus};
pub use signal::{OrderKind, SignalAction, SignalRecord};
pub use strategy::{Strategy, StrategyKind, VenueKind, DEFAULT_AUTOMATIC_STRATEGY};
