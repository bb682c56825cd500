use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use hollowmere_character::CharacterError;
use hollowmere_choices::ChoiceError;
use hollowmere_combat::CombatError;
use hollowmere_content::ContentError;
use hollowmere_llm::LlmError;
use hollowmere_npc::NpcError;
use hollowmere_persistence::PersistenceError;
use hollowmere_quests::QuestError;
use hollowmere_session::SessionError;
use hollowmere_shop::ShopError;
use hollowmere_world::WorldError;

/// Every error kind the HTTP surface can produce, mapped to a status code
/// and a `{error, code}` JSON body per §7's recovery table. This is the
/// single place that turns a subsystem error into a wire response.
#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    InvalidSession,
    NotInCombat,
    AlreadyInCombat,
    TravelInCombat,
    NotFound(String),
    Conflict(String),
    LlmUnavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::InvalidSession => "invalid_session",
            ApiError::NotInCombat => "not_in_combat",
            ApiError::AlreadyInCombat => "already_in_combat",
            ApiError::TravelInCombat => "travel_in_combat",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::LlmUnavailable(_) => "llm_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::InvalidSession
            | ApiError::NotInCombat
            | ApiError::AlreadyInCombat
            | ApiError::TravelInCombat
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LlmUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!(error = %message, "internal API error"),
            StatusCode::BAD_GATEWAY => warn!(error = %message, "upstream llm error"),
            _ => warn!(error = %message, code = self.code(), "rejected request"),
        }
        let body = ErrorBody { error: message, code: self.code() };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidInput(msg) => write!(f, "{msg}"),
            ApiError::InvalidSession => write!(f, "invalid or expired session"),
            ApiError::NotInCombat => write!(f, "not currently in combat"),
            ApiError::AlreadyInCombat => write!(f, "combat is already in progress"),
            ApiError::TravelInCombat => write!(f, "cannot travel while in combat"),
            ApiError::NotFound(msg) => write!(f, "{msg}"),
            ApiError::Conflict(msg) => write!(f, "{msg}"),
            ApiError::LlmUnavailable(msg) => write!(f, "{msg}"),
            ApiError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidSession => ApiError::InvalidSession,
            SessionError::InvalidInput { .. } => ApiError::InvalidInput(err.to_string()),
            SessionError::TravelInCombat => ApiError::TravelInCombat,
            SessionError::NotInCombat => ApiError::NotInCombat,
            SessionError::AlreadyInCombat => ApiError::AlreadyInCombat,
            SessionError::UnknownScenario(_)
            | SessionError::UnknownLocation(_)
            | SessionError::UnknownNpc(_)
            | SessionError::UnknownItem(_) => ApiError::InvalidInput(err.to_string()),
            SessionError::Character(e) => e.into(),
            SessionError::World(e) => e.into(),
            SessionError::Npc(e) => e.into(),
            SessionError::Shop(e) => e.into(),
            SessionError::Quest(e) => e.into(),
            SessionError::Combat(e) => e.into(),
            SessionError::Choice(e) => e.into(),
            SessionError::Content(e) => e.into(),
            SessionError::Llm(e) => e.into(),
            SessionError::TurnTimeout => ApiError::LlmUnavailable("the action pipeline timed out".to_string()),
        }
    }
}

impl From<CharacterError> for ApiError {
    fn from(err: CharacterError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<WorldError> for ApiError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::NoSuchExit | WorldError::BlockedByScene | WorldError::UnknownLocation(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            WorldError::ConditionFailed { fail_message } => ApiError::InvalidInput(fail_message),
        }
    }
}

impl From<NpcError> for ApiError {
    fn from(err: NpcError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<QuestError> for ApiError {
    fn from(err: QuestError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<CombatError> for ApiError {
    fn from(err: CombatError) -> Self {
        match err {
            CombatError::NotInCombat => ApiError::NotInCombat,
            CombatError::AlreadyInCombat => ApiError::AlreadyInCombat,
            _ => ApiError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ChoiceError> for ApiError {
    fn from(err: ChoiceError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => ApiError::LlmUnavailable("llm request timed out after one retry".to_string()),
            LlmError::Unavailable(msg) => ApiError::LlmUnavailable(msg),
            LlmError::MalformedResponse(msg) | LlmError::Template(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PersistenceError::VersionMismatch { .. } | PersistenceError::Corrupted(_) | PersistenceError::ScenarioMismatch { .. } => {
                ApiError::Conflict(err.to_string())
            }
            PersistenceError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Shorthand for handlers that want to reject a malformed request body or
/// query parameter before it ever reaches a subsystem call.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::InvalidInput(message.into())
}
