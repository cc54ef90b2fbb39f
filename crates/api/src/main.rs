use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::app::build_router;
use api::config::{BackendConfig, ServerConfig};
use api::datasource::{InMemoryMarketApi, MarketApi, PgMarketApi};
use api::gql::build_schema;
use api::services::spawn_janitor_service;
use api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let market_api: Arc<dyn MarketApi> = match &config.backend {
        BackendConfig::Postgres {
            database_url,
            max_connections,
            skip_migrations,
        } => {
            let pool = infra::db::connect(database_url, *max_connections).await?;
            tracing::info!(
                "Connected to Postgres with max {} connections",
                max_connections
            );

            if *skip_migrations {
                tracing::info!("Skipping database migrations (SKIP_MIGRATIONS=true)");
            } else {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("../../migrations").run(&pool).await?;
                tracing::info!("Database migrations completed successfully");
            }

            Arc::new(PgMarketApi::new(pool))
        }
        BackendConfig::Memory => {
            tracing::warn!("Using the in-memory market backend; data is lost on restart");
            Arc::new(InMemoryMarketApi::new())
        }
    };

    let port = config.port;
    let state = AppState::new(market_api, config);
    let schema = build_schema(state.clone());

    let _janitor_handle = spawn_janitor_service(state.clone());
    tracing::info!("Janitor service started");

    let app = build_router(state, schema)?;

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    // Peer addresses feed the per-IP governor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
