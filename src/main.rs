use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use factory_events_service::clock::SystemClock;
use factory_events_service::http::{router, HttpState};
use factory_events_service::service::{
    IngestService, LineStatsService, MachineStatsService, ResolverStrategy,
};
use factory_events_service::store::EventStore;
use factory_events_service::telemetry::{init_tracing, Telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(None);

    let addr: SocketAddr = env_or("FACTORY_EVENTS_ADDR", "127.0.0.1:3000")
        .parse()
        .context("FACTORY_EVENTS_ADDR must be host:port")?;
    let strategy: ResolverStrategy = env_or("FACTORY_EVENTS_STRATEGY", "upsert").parse()?;

    let store = EventStore::new();
    let telemetry = Telemetry::new();
    let ingest = IngestService::new(
        strategy.build(store.clone()),
        Arc::new(SystemClock),
        telemetry.clone(),
    );
    let state = Arc::new(HttpState {
        ingest,
        machine_stats: MachineStatsService::new(store.clone()),
        line_stats: LineStatsService::new(store),
        telemetry,
    });

    info!(%addr, ?strategy, "starting factory events service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
