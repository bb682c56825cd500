//! Hollowmere engine server — the composition root. Wires the content
//! catalog, LLM client, session manager, and action pipeline into one
//! `AppState` and serves the HTTP surface defined under `routes/`.

mod combat_ops;
mod error;
mod extract;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hollowmere_content::ContentCatalog;
use hollowmere_llm::{LlmClient, MockLlm, OllamaClient};
use hollowmere_session::{ActionPipeline, EngineConfig, SessionManager};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hollowmere_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, mock_llm = config.uses_mock_llm(), "starting hollowmere engine");

    let catalog = Arc::new(ContentCatalog::bundled());

    let llm: Arc<dyn LlmClient> = if config.uses_mock_llm() {
        tracing::warn!("LLM_API_KEY not set, narration will use the deterministic mock client");
        Arc::new(MockLlm::generic())
    } else {
        Arc::new(OllamaClient::new(config.llm_base_url.clone(), config.llm_model.clone()))
    };

    let mut session_manager = SessionManager::new(Duration::from_secs(config.session_timeout_minutes * 60));
    session_manager.spawn_reaper();

    let state = AppState {
        sessions: Arc::new(session_manager),
        catalog,
        llm,
        pipeline: Arc::new(ActionPipeline::new()),
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.bind_addr().parse()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
