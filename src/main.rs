//! Keydrop Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use keydrop_core::config::AppConfig;
use keydrop_core::error::AppError;
use keydrop_database::DatabasePool;
use keydrop_database::repositories::{
    CommunitySettingsRepository, RecordRepository, ViewPointerRepository,
};
use keydrop_database::store::RecordStore;
use keydrop_platform::{CachedDirectory, PlatformClient};
use keydrop_service::{
    AllocationEngine, CommandDispatcher, HandlerContext, InventoryAggregator,
    LeaderboardAggregator, SettingsService, ViewStore,
};
use keydrop_worker::{CronScheduler, ViewRefreshJob};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("KEYDROP_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Keydrop v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        keydrop_database::migration::run_migrations(database.pool()).await?;
    } else {
        tracing::info!("Skipping database migrations");
    }

    // ── Step 2: Repositories ─────────────────────────────────────
    let records: Arc<dyn RecordStore> =
        Arc::new(RecordRepository::new(database.pool().clone()));
    let pointers = Arc::new(ViewPointerRepository::new(database.pool().clone()));
    let settings_repo = Arc::new(CommunitySettingsRepository::new(database.pool().clone()));

    // ── Step 3: Platform adapter ─────────────────────────────────
    tracing::info!(api_base = %config.platform.api_base, "Initializing platform client...");
    let platform = PlatformClient::new(&config.platform)?;
    let directory = Arc::new(CachedDirectory::new(platform.clone(), &config.platform));
    let platform = Arc::new(platform);

    // ── Step 4: Services ─────────────────────────────────────────
    let views = Arc::new(ViewStore::new(
        pointers,
        platform.clone(),
        InventoryAggregator::new(Arc::clone(&records)),
        LeaderboardAggregator::new(
            Arc::clone(&records),
            directory,
            config.views.leaderboard_size,
        ),
        config.views.clone(),
    ));
    let engine = Arc::new(AllocationEngine::new(
        records,
        platform.clone(),
        platform,
        Arc::clone(&views),
        config.allocation.clone(),
    ));
    let settings = Arc::new(SettingsService::new(settings_repo));

    let context = HandlerContext::new(engine, Arc::clone(&views), settings);
    let dispatcher = Arc::new(CommandDispatcher::with_default_handlers(
        context,
        config.access.clone(),
    ));
    if config.access.allowed_communities.is_empty() {
        tracing::warn!("No allowed communities configured; commands are accepted from any community");
    }
    if config.access.api_token.is_empty() {
        tracing::warn!("access.api_token is empty; every protected API request will be rejected");
    }

    // ── Step 5: Background worker ────────────────────────────────
    let scheduler = if config.worker.enabled {
        let job = ViewRefreshJob::new(Arc::clone(&views));
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_default_tasks(&config.worker, job.clone())
            .await?;
        scheduler.start().await?;

        if config.worker.refresh_on_startup {
            tokio::spawn(async move {
                if let Err(e) = job.run().await {
                    tracing::error!("Startup view refresh failed: {}", e);
                }
            });
        }
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let state = keydrop_api::AppState::new(
        Arc::new(config.clone()),
        Some(database.clone()),
        dispatcher,
        views,
    );
    let app = keydrop_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Keydrop server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(Err(e)) => tracing::warn!("Scheduler shutdown failed: {}", e),
            Err(_) => tracing::warn!("Scheduler did not stop within {}s", grace.as_secs()),
            Ok(Ok(())) => {}
        }
    }

    database.close().await;
    tracing::info!("Keydrop server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
