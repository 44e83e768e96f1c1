//! Demo run: drives the full pipeline against the simulated exchange.
//!
//! Submits a handful of alerts through the webhook surface, approves a
//! manually-routed one, and prints the resulting audit trail. RUST_LOG
//! controls verbosity.

use std::time::Duration;

use log::info;

use hermes_core::{Strategy, StrategyKind, VenueKind};
use hermes_runner::{AlertRequest, build_app, load_default_config};
use hermes_store::{
    OrderStore, PendingSignalFilter, PositionStore, SignalStore, StrategyStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_default_config()?;
    let token = config.webhook_token.clone();
    let app = build_app(&config).await?;

    let manual = Strategy::new("Swing Manual", StrategyKind::Manual, VenueKind::Spot);
    StrategyStore::insert(app.store.as_ref(), &manual).await?;

    // Automatic market buy, executed in the background after the ack.
    let buy: AlertRequest = serde_json::from_str(
        r#"{"action": "buy", "symbol": "BTCUSDT", "quantity": "0.01"}"#,
    )?;
    let ack = app.dispatcher.handle_alert(Some(&token), buy.clone()).await?;
    info!("accepted signal {} (approval: {})", ack.signal_id, ack.requires_approval);

    // Identical resend inside the dedup window.
    match app.dispatcher.handle_alert(Some(&token), buy).await {
        Err(err) => info!("duplicate refused with HTTP {}", err.status_code()),
        Ok(_) => unreachable!("duplicate must be refused"),
    }

    // Oversized order, blocked by the risk engine and audited.
    let oversized: AlertRequest = serde_json::from_str(
        r#"{"action": "buy", "symbol": "ETHUSDT", "quantity": "10"}"#,
    )?;
    app.dispatcher.handle_alert(Some(&token), oversized).await?;

    // Manually-routed sell, parked for review and then approved.
    let manual_alert: AlertRequest = serde_json::from_str(
        r#"{"action": "sell", "symbol": "BTCUSDT", "quantity": "0.01", "strategy": "Swing Manual"}"#,
    )?;
    app.dispatcher.handle_alert(Some(&token), manual_alert).await?;

    // Let the worker drain before reviewing.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let parked = app.pending.list(PendingSignalFilter::default()).await?;
    for row in &parked {
        let order = app.pending.approve(row.id, "demo-operator").await?;
        info!("approved pending {} -> order {:?}", row.id, order);
    }

    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("\n== signals ==");
    for signal in SignalStore::list_recent(app.store.as_ref(), 10).await? {
        println!(
            "{} {:<5} {:<8} processed={} error={:?}",
            signal.id,
            signal.action.as_str(),
            signal.symbol,
            signal.processed,
            signal.error
        );
    }

    println!("\n== orders ==");
    for order in OrderStore::list_recent(app.store.as_ref(), 10).await? {
        println!(
            "{} {:<4} {:<8} qty={} status={:?} risk_passed={} error={:?}",
            order.id,
            order.side.as_str(),
            order.symbol,
            order.quantity,
            order.status,
            order.risk_passed,
            order.error
        );
    }

    println!("\n== positions ==");
    for position in PositionStore::list_recent(app.store.as_ref(), 10).await? {
        println!(
            "{} {:?} {:<8} qty={} entry={} realized_pnl={} status={:?}",
            position.id,
            position.side,
            position.symbol,
            position.quantity,
            position.entry_price,
            position.realized_pnl,
            position.status
        );
    }

    app.dispatcher.shutdown().await;
    Ok(())
}
