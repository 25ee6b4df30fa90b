mod config;
mod error;
mod llm;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::services::gallery::{GraphqlIndexer, Indexer};
use crate::services::publish::{HttpUploader, Uploader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env()?;

    let llm: Option<Arc<dyn LlmChat>> = match &config.llm {
        Some(settings) => {
            let client = llm::LlmClient::new(settings)?;
            tracing::info!(model = client.model(), backend = ?settings.backend, "LLM client initialized");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("no LLM API key configured (LLM_API_KEY_ENV); AI features disabled");
            None
        }
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("drawwy-server/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let uploader: Option<Arc<dyn Uploader>> = match &config.upload_url {
        Some(url) => {
            tracing::info!(%url, "uploader configured");
            Some(Arc::new(HttpUploader::new(http.clone(), url.clone(), config.upload_token.clone())))
        }
        None => {
            tracing::warn!("DRAWWY_UPLOAD_URL not set; publishing disabled");
            None
        }
    };
    let indexer: Arc<dyn Indexer> = Arc::new(GraphqlIndexer::new(http, &config));

    let port = config.port;
    let state = state::AppState::new(config, llm, uploader, indexer);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "drawwy listening");
    axum::serve(listener, app).await?;
    Ok(())
}
