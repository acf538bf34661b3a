use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use prompt_dispatch::config::Config;
use prompt_dispatch::embeddings::EmbeddingClient;
use prompt_dispatch::error::DispatchError;
use prompt_dispatch::registry::FunctionRegistry;
use prompt_dispatch::search::QdrantSearch;
use prompt_dispatch::service::{self, AppState};
use prompt_dispatch::session::SessionManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    let registry = Arc::new(FunctionRegistry::builtin());

    let embedder = EmbeddingClient::new(&config)?;
    let search = QdrantSearch::new(&config, embedder)?;
    search.ensure_collection().await?;
    // Seed the index only on first run, when the collection is empty
    search.index_registry(&registry).await?;

    let state = AppState {
        registry,
        search: Arc::new(search),
        sessions: Arc::new(SessionManager::new()),
    };

    let bind: SocketAddr = config.server.bind.parse().map_err(|_| {
        DispatchError::Config(format!("Invalid bind address: {}", config.server.bind))
    })?;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "Starting {} v{}", config.server.name, config.server.version);

    axum::serve(listener, service::router(state)).await?;
    Ok(())
}
