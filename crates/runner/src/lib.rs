//! Hermes service wiring.
//!
//! Webhook wire types, the bounded dispatch queue, JSON configuration and
//! the bootstrap that assembles the engine over the simulated exchange.

mod bootstrap;
mod config;
mod dispatch;
mod webhook;

pub use bootstrap::{App, build_app};
pub use config::{
    ConfigError, RetryConfig, RiskConfig, ServiceConfig, SimulationSeed, load_config,
    load_config_from_str, load_default_config,
};
pub use dispatch::SignalDispatcher;
pub use webhook::{AlertRequest, AlertResponse, ApiError, ErrorBody, ErrorDetail};
