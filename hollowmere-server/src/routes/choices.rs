use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_choices::ChoiceOutcome;
use hollowmere_content::{ChoiceDef, EndingDef};

use crate::error::ApiError;
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/choices/available", get(available))
        .route("/api/choices/select", post(select))
        .route("/api/choices/history", get(history))
        .route("/api/choices/ending", get(ending))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

async fn available(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Vec<ChoiceDef>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    let choices: Vec<ChoiceDef> = session
        .choices
        .available(&session.scenario, &session.game_flags)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(choices))
}

#[derive(Deserialize)]
struct SelectRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    choice_id: String,
    option_id: String,
}

async fn select(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SelectRequest>,
) -> Result<Json<ChoiceOutcome>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    let outcome = session.choices.select(
        &session.scenario,
        &body.choice_id,
        &body.option_id,
        &session.character,
        &mut session.dice,
        &mut session.npcs,
        &mut session.quests,
        session.turn,
    )?;

    for flag in &outcome.flags_set {
        session.game_flags.insert(flag.clone());
    }

    Ok(Json(outcome))
}

async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Vec<(String, String)>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(session.choices.history().to_vec()))
}

#[derive(Serialize)]
struct EndingResponse {
    ending: Option<EndingDef>,
}

async fn ending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<EndingResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    let ending = session
        .choices
        .predict_ending(&session.scenario, &session.game_flags)
        .cloned();
    Ok(Json(EndingResponse { ending }))
}
