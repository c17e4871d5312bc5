use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmGateway;
use crate::resume::scratch::ScratchDir;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Gateway to the text-generation model. `GeminiClient` in production.
    pub llm: Arc<dyn LlmGateway>,
    pub sessions: SessionStore,
    /// Where uploaded résumés are written before extraction.
    pub scratch: ScratchDir,
    pub config: Config,
}
