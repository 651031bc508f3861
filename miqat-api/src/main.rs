use anyhow::Context;
use miqat_api::{
    app,
    state::{AppState, AuthConfig},
};
use miqat_store::{app_config::Config, DbClient, PgGrantRepository, PgInventoryRepository, PgOrganizationRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Miqat API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let pricing = match db.fetch_pricing_rules(config.pricing).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to configured pricing rules");
            config.pricing
        }
    };

    let inventory = Arc::new(PgInventoryRepository::new(db.pool.clone()));
    let state = AppState::new(
        Arc::new(PgOrganizationRepository::new(db.pool.clone())),
        Arc::new(PgGrantRepository::new(db.pool.clone())),
        inventory.clone(),
        inventory.clone(),
        inventory,
        config.visibility,
        pricing,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state)).await.context("Server error")?;
    Ok(())
}
