use std::net::SocketAddr;
use std::sync::Arc;

use tessera_api::{app, worker, AppState};
use tessera_core::repository::EventRepository;
use tessera_core::{Clock, SystemClock};
use tessera_reserve::ReservationService;
use tessera_store::InMemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tessera_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tessera API on port {}", config.server.port);

    let store: Arc<dyn EventRepository> = Arc::new(InMemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let service = Arc::new(ReservationService::new(
        store.clone(),
        clock.clone(),
        chrono::Duration::seconds(config.business_rules.seat_hold_seconds as i64),
    ));

    tokio::spawn(worker::start_sweep_worker(
        store,
        clock,
        std::time::Duration::from_secs(config.business_rules.sweep_interval_seconds),
    ));

    let app = app(AppState { service });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
