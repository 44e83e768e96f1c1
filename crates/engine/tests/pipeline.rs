//! End-to-end pipeline tests over the in-memory store and the simulated
//! exchange: intake, risk, execution, bookkeeping and the manual-approval
//! workflow.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use hermes_core::{
    OrderKind, OrderStatus, PendingStatus, PositionSide, SignalAction, SignalRecord, Strategy,
    StrategyKind, VenueKind,
};
use hermes_engine::{
    DedupCache, EngineError, ExecutionEngine, InboundAlert, PendingWorkflow, PositionLedger,
    RiskEngine, RiskLimits, SignalIntake, SubmitOutcome,
};
use hermes_gateway::{GatewayError, SimulatedExchange};
use hermes_store::{
    ConfigStore, MemoryStore, OrderStore, PendingSignalStore, PositionStore, SignalStore,
    StrategyStore,
};

struct Harness {
    store: Arc<MemoryStore>,
    sim: Arc<SimulatedExchange>,
    intake: SignalIntake,
    execution: Arc<ExecutionEngine>,
    pending: PendingWorkflow,
}

impl Harness {
    fn new() -> Self {
        let _ = env_logger::try_init();
        let store = MemoryStore::new();
        let sim = Arc::new(SimulatedExchange::new());
        sim.set_price("BTCUSDT", dec!(100));
        sim.set_balance("USDT", dec!(10000));

        let risk = Arc::new(RiskEngine::new(
            store.clone(),
            store.clone(),
            sim.clone(),
            RiskLimits::default(),
        ));
        let ledger = Arc::new(PositionLedger::new(store.clone()));
        let execution = Arc::new(ExecutionEngine::new(
            store.clone(),
            store.clone(),
            risk,
            ledger,
            sim.clone(),
        ));
        let intake = SignalIntake::new(
            store.clone(),
            store.clone(),
            Arc::new(DedupCache::new(Duration::from_secs(60))),
        );
        let pending = PendingWorkflow::new(
            store.clone(),
            store.clone(),
            store.clone(),
            execution.clone(),
        );

        Self {
            store,
            sim,
            intake,
            execution,
            pending,
        }
    }

    async fn add_strategy(&self, strategy: &Strategy) {
        StrategyStore::insert(self.store.as_ref(), strategy)
            .await
            .unwrap();
    }

    async fn signal(&self, outcome: &SubmitOutcome) -> SignalRecord {
        SignalStore::get(self.store.as_ref(), outcome.signal_id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn strategy_of(&self, outcome: &SubmitOutcome) -> Option<Strategy> {
        match outcome.strategy_id {
            Some(id) => StrategyStore::get(self.store.as_ref(), id).await.unwrap(),
            None => None,
        }
    }

    /// The dispatcher's automatic route, inlined.
    async fn run(&self, alert: InboundAlert) -> Result<uuid::Uuid, EngineError> {
        let outcome = self.intake.submit(alert).await?;
        let signal = self.signal(&outcome).await;
        let strategy = self.strategy_of(&outcome).await;
        self.execution
            .execute_from_signal(&signal, strategy.as_ref(), false, false)
            .await
    }
}

fn buy(quantity: &str) -> InboundAlert {
    InboundAlert {
        action: SignalAction::Buy,
        symbol: "BTCUSDT".to_string(),
        order_kind: OrderKind::Market,
        price: None,
        quantity: Some(quantity.parse().unwrap()),
        stop_loss: None,
        strategy_name: None,
        raw_payload: serde_json::json!({"action": "buy", "symbol": "BTCUSDT"}),
    }
}

fn sell(quantity: &str) -> InboundAlert {
    InboundAlert {
        action: SignalAction::Sell,
        quantity: Some(quantity.parse().unwrap()),
        ..buy(quantity)
    }
}

#[tokio::test]
async fn automatic_buy_places_order_and_opens_position() {
    let h = Harness::new();

    let order_id = h.run(buy("1")).await.unwrap();

    let order = OrderStore::get(h.store.as_ref(), order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert!(order.risk_passed);
    assert!(order.exchange_order_id.is_some());
    assert_eq!(order.avg_fill_price, Some(dec!(100)));

    let position = h.store.open_for_symbol("BTCUSDT").await.unwrap().unwrap();
    assert_eq!(position.side, PositionSide::Long);
    assert_eq!(position.quantity, dec!(1));
    assert_eq!(position.entry_order_id, Some(order_id));

    let signal = SignalStore::list_recent(h.store.as_ref(), 1).await.unwrap();
    assert!(signal[0].processed);
    assert_eq!(signal[0].order_id, Some(order_id));
    assert!(signal[0].error.is_none());
}

#[tokio::test]
async fn buy_then_sell_realizes_pnl_through_the_pipeline() {
    let h = Harness::new();

    h.run(buy("1")).await.unwrap();
    h.sim.set_price("BTCUSDT", dec!(110));
    h.run(sell("1")).await.unwrap();

    assert!(h.store.open_for_symbol("BTCUSDT").await.unwrap().is_none());
    let positions = PositionStore::list_recent(h.store.as_ref(), 10)
        .await
        .unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].realized_pnl, dec!(10));
    assert_eq!(positions[0].exit_price, Some(dec!(110)));
}

#[tokio::test]
async fn risk_rejection_leaves_an_audit_row() {
    let h = Harness::new();

    // 20 * 100 = 2000 notional = 20% of the 10000 balance, over the 10% cap.
    let err = h.run(buy("20")).await.unwrap_err();
    let EngineError::RiskRejected { reason } = err else {
        panic!("expected a risk rejection");
    };
    assert!(reason.contains("exceeds max"));

    let orders = OrderStore::list_recent(h.store.as_ref(), 10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Rejected);
    assert!(!orders[0].risk_passed);
    assert_eq!(orders[0].error.as_deref(), Some(reason.as_str()));

    let signals = SignalStore::list_recent(h.store.as_ref(), 10).await.unwrap();
    assert!(signals[0].processed);
    assert_eq!(signals[0].order_id, Some(orders[0].id));

    // Nothing reached the book.
    assert!(h.store.open_for_symbol("BTCUSDT").await.unwrap().is_none());
}

#[tokio::test]
async fn gateway_failure_on_automatic_route_is_audited() {
    let h = Harness::new();
    h.sim.inject_order_failure(GatewayError::Exchange {
        code: 503,
        message: "maintenance".into(),
    });

    let err = h.run(buy("1")).await.unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    let orders = OrderStore::list_recent(h.store.as_ref(), 10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Rejected);
    // Risk approved the attempt; the exchange refused it.
    assert!(orders[0].risk_passed);
    assert!(orders[0].error.as_deref().unwrap().contains("maintenance"));
}

#[tokio::test]
async fn manual_route_parks_executes_on_approval_and_is_terminal() {
    let h = Harness::new();
    let manual = Strategy::new("Swing Manual", StrategyKind::Manual, VenueKind::Spot);
    h.add_strategy(&manual).await;

    let mut alert = buy("1");
    alert.strategy_name = Some("Swing Manual".to_string());
    let outcome = h.intake.submit(alert).await.unwrap();
    assert!(outcome.requires_approval);

    let signal = h.signal(&outcome).await;
    let parked = h
        .pending
        .create_from_signal(&signal, manual.id)
        .await
        .unwrap();
    assert_eq!(h.pending.count_pending().await.unwrap(), 1);

    let order_id = h.pending.approve(parked.id, "alice").await.unwrap();
    let order_id = order_id.expect("first approve executes");

    let row = PendingSignalStore::get(h.store.as_ref(), parked.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, PendingStatus::Approved);
    assert_eq!(row.order_id, Some(order_id));
    assert_eq!(row.reviewed_by.as_deref(), Some("alice"));

    // A second decision of either kind is a no-op.
    assert!(h.pending.approve(parked.id, "bob").await.unwrap().is_none());
    assert!(!h.pending.reject(parked.id, "bob").await.unwrap());
    let row = PendingSignalStore::get(h.store.as_ref(), parked.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, PendingStatus::Approved);
    assert_eq!(row.reviewed_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn approval_bypasses_the_trading_enabled_gate() {
    let h = Harness::new();
    h.store.set("trading_enabled", "false").await.unwrap();
    let manual = Strategy::new("Swing Manual", StrategyKind::Manual, VenueKind::Spot);
    h.add_strategy(&manual).await;

    let mut alert = buy("1");
    alert.strategy_name = Some("Swing Manual".to_string());
    let outcome = h.intake.submit(alert).await.unwrap();
    let signal = h.signal(&outcome).await;
    let parked = h
        .pending
        .create_from_signal(&signal, manual.id)
        .await
        .unwrap();

    assert!(h.pending.approve(parked.id, "alice").await.unwrap().is_some());
}

#[tokio::test]
async fn gateway_failure_after_approval_fails_the_pending_row_without_an_order() {
    let h = Harness::new();
    let manual = Strategy::new("Swing Manual", StrategyKind::Manual, VenueKind::Spot);
    h.add_strategy(&manual).await;

    let mut alert = buy("1");
    alert.strategy_name = Some("Swing Manual".to_string());
    let outcome = h.intake.submit(alert).await.unwrap();
    let signal = h.signal(&outcome).await;
    let parked = h
        .pending
        .create_from_signal(&signal, manual.id)
        .await
        .unwrap();

    h.sim
        .inject_order_failure(GatewayError::Transport("connection reset".into()));
    let err = h.pending.approve(parked.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    // No rejected-order record for a trade a human already approved.
    let orders = OrderStore::list_recent(h.store.as_ref(), 10).await.unwrap();
    assert!(orders.is_empty());

    let row = PendingSignalStore::get(h.store.as_ref(), parked.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, PendingStatus::Failed);
    assert!(row.error.as_deref().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn reject_never_touches_the_exchange() {
    let h = Harness::new();
    let manual = Strategy::new("Swing Manual", StrategyKind::Manual, VenueKind::Spot);
    h.add_strategy(&manual).await;

    let mut alert = buy("1");
    alert.strategy_name = Some("Swing Manual".to_string());
    let outcome = h.intake.submit(alert).await.unwrap();
    let signal = h.signal(&outcome).await;
    let parked = h
        .pending
        .create_from_signal(&signal, manual.id)
        .await
        .unwrap();

    assert!(h.pending.reject(parked.id, "alice").await.unwrap());
    assert!(
        OrderStore::list_recent(h.store.as_ref(), 10)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(h.pending.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn leveraged_strategy_sets_leverage_and_books_a_short() {
    let h = Harness::new();
    h.sim.set_price("ETHUSDT", dec!(100));
    let levered =
        Strategy::new("Perp Momentum", StrategyKind::Automatic, VenueKind::Leveraged)
            .with_leverage(5);
    h.add_strategy(&levered).await;

    let mut alert = sell("1");
    alert.symbol = "ETHUSDT".to_string();
    alert.strategy_name = Some("Perp Momentum".to_string());
    let outcome = h.intake.submit(alert).await.unwrap();
    let signal = h.signal(&outcome).await;
    let strategy = h.strategy_of(&outcome).await;
    h.execution
        .execute_from_signal(&signal, strategy.as_ref(), false, false)
        .await
        .unwrap();

    assert_eq!(h.sim.leverage_for("ETHUSDT"), Some(5));
    let position = h.store.open_for_symbol("ETHUSDT").await.unwrap().unwrap();
    assert_eq!(position.side, PositionSide::Short);
    // 100 * (1 + 1/5)
    assert_eq!(position.liquidation_price, Some(dec!(120)));
}

#[tokio::test]
async fn duplicate_submission_yields_one_accepted_signal() {
    let h = Harness::new();

    h.intake.submit(buy("1")).await.unwrap();
    let err = h.intake.submit(buy("2")).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateSignal(_)));

    let signals = SignalStore::list_recent(h.store.as_ref(), 10).await.unwrap();
    assert_eq!(signals.len(), 2);
    assert_eq!(signals.iter().filter(|s| s.error.is_none()).count(), 1);
}
