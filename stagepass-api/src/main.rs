use std::net::SocketAddr;
use std::sync::Arc;

use stagepass_api::{app, AppState};
use stagepass_booking::{
    BookingEventBus, BookingOrchestrator, DuplicateBookingGuard, RemoteSyncClient,
};
use stagepass_core::legacy::RecentBookingsCache;
use stagepass_core::remote::InMemoryRemoteStore;
use stagepass_core::sms::LogSmsGateway;
use stagepass_core::{Clock, RemoteBookingStore, SystemClock};
use stagepass_store::app_config::Config;
use stagepass_store::{BookingStore, RedisRemoteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stagepass_api=debug,stagepass_booking=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Stagepass API on port {}", config.server.port);

    // Local history
    let store = BookingStore::connect(&config.database.url).await?;
    store.migrate().await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Remote mirror
    let remote: Arc<dyn RemoteBookingStore> = match &config.redis {
        Some(redis) => Arc::new(RedisRemoteStore::new(&redis.url)?),
        None => {
            tracing::warn!("No redis configured, remote bookings are kept in memory");
            Arc::new(InMemoryRemoteStore::with_clock(clock.clone()))
        }
    };

    let bus = BookingEventBus::default();
    let guard = Arc::new(DuplicateBookingGuard::new(clock.clone()));
    let _listener = guard.attach(&bus);

    let orchestrator = BookingOrchestrator::new(
        Arc::new(store),
        RemoteSyncClient::new(remote, clock.clone()),
        guard,
        bus,
        clock,
    )
    .with_legacy_cache(Arc::new(RecentBookingsCache::new(config.legacy_cache.capacity)))
    .with_sms(Arc::new(LogSmsGateway::new(
        config.sms.enabled,
        config.sms.default_destination.clone(),
    )));

    let app = app(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
