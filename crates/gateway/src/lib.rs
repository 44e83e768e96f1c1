//! Hermes Gateway
//!
//! The Exchange Gateway contract the execution engine consumes, plus the
//! pieces that wrap it: wire request/ack types, a bounded-retry decorator
//! for transient failures, and an in-memory simulated exchange used by
//! tests and the demo runner. Real connectivity (signing, rate limiting,
//! market-data breadth) lives behind the same trait in a separate adapter.

mod error;
mod messages;
mod port;
mod retry;
mod simulator;

pub use error::{GatewayError, GatewayResult};
pub use messages::{Balance, GatewayFill, GatewayOrderRequest, OrderAck};
pub use port::ExchangeGateway;
pub use retry::{RetryPolicy, RetryingGateway};
pub use simulator::SimulatedExchange;
