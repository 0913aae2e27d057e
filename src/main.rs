use roshambo::{
    config::{RoomStore, ServerConfig},
    event::EventBus,
    room::{
        start_cleanup_task, CleanupConfig, InMemoryRoomRepository, PostgresRoomRepository,
        RoomRepository, RoomService,
    },
    user::InMemoryPlayerDirectory,
    websockets::InMemoryConnectionManager,
    AppState,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roshambo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    info!(
        bind_addr = %config.bind_addr,
        room_store = ?config.room_store,
        sync_mode = %config.sync_mode,
        "Starting roshambo room server"
    );

    let room_repository: Arc<dyn RoomRepository + Send + Sync> = match config.room_store {
        RoomStore::Memory => Arc::new(InMemoryRoomRepository::new(config.room_ttl)),
        RoomStore::Postgres => {
            let Some(database_url) = config.database_url.as_deref() else {
                error!("ROOM_STORE=postgres requires DATABASE_URL");
                return;
            };
            let pool = match sqlx::PgPool::connect(database_url).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return;
                }
            };
            let repository = PostgresRoomRepository::new(pool, config.room_ttl);
            if let Err(e) = repository.ensure_schema().await {
                error!(error = %e, "Failed to prepare room table");
                return;
            }
            Arc::new(repository)
        }
    };

    let event_bus = EventBus::new();
    let room_service = Arc::new(RoomService::new(
        room_repository,
        Arc::new(InMemoryPlayerDirectory::new()),
        event_bus.clone(),
        &config,
    ));

    tokio::spawn(start_cleanup_task(
        Arc::clone(&room_service),
        CleanupConfig::from(&config),
    ));

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(
        room_service,
        Arc::new(InMemoryConnectionManager::new()),
        event_bus,
        Arc::new(config),
    );
    let app = roshambo::app(app_state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind_addr = %bind_addr, error = %e, "Failed to bind");
            return;
        }
    };
    info!("Server running on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped with error");
    }
}
