use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

use super::views::{character_view, CharacterView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/character/levelup", post(levelup))
        .route("/api/character/rest", post(rest))
}

#[derive(Deserialize)]
struct SessionIdBody {
    #[serde(default)]
    session_id: Option<Uuid>,
}

async fn levelup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdBody>,
) -> Result<Json<CharacterView>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut session = entry.lock().await;
    session.character.level_up()?;
    Ok(Json(character_view(&session)))
}

#[derive(Deserialize)]
struct RestRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default = "default_rest_type")]
    rest_type: String,
}

fn default_rest_type() -> String {
    "short".to_string()
}

#[derive(Serialize)]
struct RestResponse {
    healed: i32,
    character: CharacterView,
}

async fn rest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RestRequest>,
) -> Result<Json<RestResponse>, ApiError> {
    if body.rest_type != "short" {
        return Err(bad_request(format!("unsupported rest type: {}", body.rest_type)));
    }
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;
    let in_combat = session.in_combat();
    let healed = session.character.short_rest(&mut session.dice, in_combat)?;
    Ok(Json(RestResponse { healed, character: character_view(session) }))
}
