use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use hollowmere_content::ContentCatalog;
use hollowmere_llm::LlmClient;
use hollowmere_session::{ActionPipeline, EngineConfig, Session, SessionManager};

use crate::error::ApiError;

/// Everything a request handler needs, shared behind `Arc` across the whole
/// server. Session state itself lives inside `sessions`, not here: this is
/// the read-only/shared half described in §5 ("the scenario content catalog
/// is read-only and freely shared").
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub catalog: Arc<ContentCatalog>,
    pub llm: Arc<dyn LlmClient>,
    pub pipeline: Arc<ActionPipeline>,
    pub config: Arc<EngineConfig>,
}

impl AppState {
    /// Looks up a session by id, mapping an unknown id to the standard
    /// `invalid_session` API error rather than leaking the session layer's
    /// own error type past the HTTP boundary.
    pub fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        self.sessions.get(id).map_err(ApiError::from)
    }
}
