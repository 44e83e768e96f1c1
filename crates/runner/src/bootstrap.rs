//! Assembles the service from a config: stores, gateway, engine
//! components and the dispatcher.

use std::sync::Arc;

use log::info;

use hermes_core::{DEFAULT_AUTOMATIC_STRATEGY, Strategy, StrategyKind, VenueKind};
use hermes_engine::{
    DedupCache, ExecutionEngine, PendingWorkflow, PositionLedger, Result, RiskEngine, SignalIntake,
};
use hermes_gateway::{RetryingGateway, SimulatedExchange};
use hermes_store::{MemoryStore, StrategyStore};

use crate::config::ServiceConfig;
use crate::dispatch::SignalDispatcher;

/// The wired service. The store and simulator handles stay accessible for
/// inspection and seeding; everything else runs behind the dispatcher.
pub struct App {
    pub store: Arc<MemoryStore>,
    pub simulator: Arc<SimulatedExchange>,
    pub dispatcher: SignalDispatcher,
    pub pending: Arc<PendingWorkflow>,
}

/// Build the service over the in-memory store and the simulated exchange,
/// seeded from the config. Ensures the default automatic strategy exists.
pub async fn build_app(config: &ServiceConfig) -> Result<App> {
    let store = MemoryStore::new();

    let simulator = Arc::new(SimulatedExchange::new());
    for (symbol, price) in &config.simulation.prices {
        simulator.set_price(symbol, *price);
    }
    for (asset, free) in &config.simulation.balances {
        simulator.set_balance(asset, *free);
    }
    let gateway = Arc::new(RetryingGateway::with_policy(
        simulator.clone(),
        config.retry_policy(),
    ));

    if StrategyStore::find_by_name(store.as_ref(), DEFAULT_AUTOMATIC_STRATEGY)
        .await?
        .is_none()
    {
        let default = Strategy::new(
            DEFAULT_AUTOMATIC_STRATEGY,
            StrategyKind::Automatic,
            VenueKind::Spot,
        );
        StrategyStore::insert(store.as_ref(), &default).await?;
        info!("[BOOT] seeded strategy {:?}", default.name);
    }

    let risk = Arc::new(RiskEngine::new(
        store.clone(),
        store.clone(),
        gateway.clone(),
        config.risk_limits(),
    ));
    let ledger = Arc::new(PositionLedger::new(store.clone()));
    let execution = Arc::new(ExecutionEngine::new(
        store.clone(),
        store.clone(),
        risk,
        ledger,
        gateway,
    ));
    let intake = Arc::new(SignalIntake::new(
        store.clone(),
        store.clone(),
        Arc::new(DedupCache::new(config.dedup_window())),
    ));
    let pending = Arc::new(PendingWorkflow::new(
        store.clone(),
        store.clone(),
        store.clone(),
        execution.clone(),
    ));

    let dispatcher = SignalDispatcher::new(
        config.webhook_token.clone(),
        config.queue_capacity,
        intake,
        execution,
        pending.clone(),
        store.clone(),
        store.clone(),
    );

    info!(
        "[BOOT] service ready ({} symbols seeded, queue depth {})",
        config.simulation.prices.len(),
        config.queue_capacity
    );

    Ok(App {
        store,
        simulator,
        dispatcher,
        pending,
    })
}
