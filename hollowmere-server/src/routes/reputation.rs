use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_npc::DispositionTier;

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reputation", get(list))
        .route("/api/reputation/{npc_id}", get(one))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

#[derive(Serialize)]
struct ReputationEntry {
    npc_id: String,
    name: String,
    disposition: i32,
    tier: DispositionTier,
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Vec<ReputationEntry>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;

    let mut entries = Vec::new();
    for npc in session.scenario.npcs.values() {
        let Ok(disposition) = session.npcs.disposition(&npc.id) else { continue };
        let Ok(tier) = session.npcs.tier(&npc.id) else { continue };
        entries.push(ReputationEntry {
            npc_id: npc.id.clone(),
            name: npc.name.clone(),
            disposition: disposition.value(),
            tier,
        });
    }
    entries.sort_by(|a, b| a.npc_id.cmp(&b.npc_id));
    Ok(Json(entries))
}

async fn one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
    Path(npc_id): Path<String>,
) -> Result<Json<ReputationEntry>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;

    let npc = session
        .scenario
        .npcs
        .get(&npc_id)
        .ok_or_else(|| bad_request(format!("unknown npc: {npc_id}")))?;
    let disposition = session.npcs.disposition(&npc_id)?;
    let tier = session.npcs.tier(&npc_id)?;
    Ok(Json(ReputationEntry {
        npc_id: npc_id.clone(),
        name: npc.name.clone(),
        disposition: disposition.value(),
        tier,
    }))
}
