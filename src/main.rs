//! Standalone server binary.

use anyhow::Context;
use gatehouse::{api::routes::create_router, db::LibsqlStore, utils::config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("configuration error: {}", e))?;

    let store = Arc::new(
        LibsqlStore::new_local(&config.database.path)
            .await
            .context("failed to initialize database")?,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(config), store);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("gatehouse listening on {}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
