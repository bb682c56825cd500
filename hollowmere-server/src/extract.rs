use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::ApiError;

/// Resolves the session id for a request per §6's convention: a
/// `session_id` field in the JSON body takes priority, falling back to the
/// `X-Session-ID` header. Neither present (or unparsable) is the same
/// `invalid_session` a caller gets for a session id that doesn't resolve.
pub fn resolve_session_id(headers: &HeaderMap, body_id: Option<Uuid>) -> Result<Uuid, ApiError> {
    if let Some(id) = body_id {
        return Ok(id);
    }
    headers
        .get("X-Session-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(ApiError::InvalidSession)
}
