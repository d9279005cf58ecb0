use std::sync::Arc;

use visura::llm::config::LlmConfig;
use visura::llm::types::LlmError;
use visura::llm::{LlmChat, LlmClient};
use visura::services::identity::{self, IdentityError};
use visura::{routes, state};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("llm config: {0}")]
    Llm(#[from] LlmError),
    #[error("identity config: {0}")]
    Identity(#[from] IdentityError),
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .map_err(|e: std::num::ParseIntError| StartupError::InvalidPort(e.to_string()))?;
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into());

    let llm_config = LlmConfig::from_env()?;
    let llm: Option<Arc<dyn LlmChat>> = match LlmClient::from_config(llm_config)? {
        Some(client) => {
            tracing::info!(model = client.model(), "llm client configured");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; relay endpoints will answer 500");
            None
        }
    };
    let identity = identity::provider_from_env()?;

    let state = state::AppState::new(llm, identity);
    let app = routes::app(state);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;

    tracing::info!(%addr, "visura listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
