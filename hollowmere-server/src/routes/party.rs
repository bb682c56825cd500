use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use hollowmere_npc::PartyMember;
use hollowmere_session::SessionContext;

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/party/view", get(view))
        .route("/api/party/recruit", post(recruit))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

async fn view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Vec<PartyMember>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(session.party.members().to_vec()))
}

#[derive(Deserialize)]
struct RecruitRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    npc_id: String,
}

async fn recruit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RecruitRequest>,
) -> Result<Json<PartyMember>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    let npc = session
        .scenario
        .npcs
        .get(&body.npc_id)
        .cloned()
        .ok_or_else(|| bad_request(format!("unknown npc: {}", body.npc_id)))?;
    let ctx = SessionContext {
        game_flags: &session.game_flags,
        quests: &session.quests,
        visited_locations: &session.visited_locations,
        character: &session.character,
    };
    let current_location = session.location.current_id().to_string();
    let member = session.party.recruit(&npc, &current_location, &ctx)?.clone();
    Ok(Json(member))
}
