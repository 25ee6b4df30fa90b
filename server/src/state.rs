//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds only immutable, `Arc`-shared clients built once in `main`: the LLM,
//! the storage uploader and the indexer. Optional clients are `None` when
//! their configuration is absent, and the matching routes answer 503.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::llm::LlmChat;
use crate::services::gallery::Indexer;
use crate::services::publish::{PublishSettings, Uploader};

/// Clone is required by Axum; every field is `Arc`-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// `None` if no upload endpoint is configured.
    pub uploader: Option<Arc<dyn Uploader>>,
    pub indexer: Arc<dyn Indexer>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ServerConfig,
        llm: Option<Arc<dyn LlmChat>>,
        uploader: Option<Arc<dyn Uploader>>,
        indexer: Arc<dyn Indexer>,
    ) -> Self {
        Self { config: Arc::new(config), llm, uploader, indexer }
    }

    #[must_use]
    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings::from(self.config.as_ref())
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
