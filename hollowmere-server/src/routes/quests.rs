use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_quests::QuestStatus;

use crate::error::ApiError;
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/quests/list", get(list))
        .route("/api/quests/complete", post(complete))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

#[derive(Serialize)]
struct QuestSummary {
    id: String,
    name: String,
    status: QuestStatus,
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Vec<QuestSummary>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;

    let mut quests: Vec<QuestSummary> = session
        .scenario
        .quests
        .values()
        .map(|q| QuestSummary {
            id: q.id.clone(),
            name: q.name.clone(),
            status: session.quests.status(&q.id),
        })
        .collect();
    quests.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(quests))
}

#[derive(Deserialize)]
struct CompleteRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    quest_id: String,
}

async fn complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<QuestSummary>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    session
        .quests
        .complete(&session.scenario, &body.quest_id, &mut session.character, &mut session.npcs)?;

    let name = session
        .scenario
        .quests
        .get(&body.quest_id)
        .map(|q| q.name.clone())
        .unwrap_or_else(|| body.quest_id.clone());
    Ok(Json(QuestSummary {
        id: body.quest_id.clone(),
        name,
        status: session.quests.status(&body.quest_id),
    }))
}
