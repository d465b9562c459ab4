use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brewery_ledger::api::{self, AppState};
use brewery_ledger::audit::AuditLogger;
use brewery_ledger::config::AppConfig;
use brewery_ledger::database::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brewery_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting brewery ledger");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded");

    // Initialize database
    let database = Database::new(&config.database_url).await?;
    info!("Database connected");

    database.run_migrations().await?;
    info!("Database migrations completed");

    let logger = AuditLogger::new(database, config.max_append_retries);
    let address = config.bind_address();

    let app = api::router(AppState { logger, config }).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .into_inner(),
    );

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
