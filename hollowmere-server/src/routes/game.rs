use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use hollowmere_character::Character;
use hollowmere_dice::Dice;
use hollowmere_persistence::{list_saves, read_save, sanitize_save_name, write_save, SaveFile};
use hollowmere_session::{Session, TurnEvent};

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

use super::views::{self, state_view, StateView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions/stats", get(session_stats))
        .route("/api/game/start", post(start))
        .route("/api/game/action", post(action))
        .route("/api/game/action/stream", post(action_stream))
        .route("/api/game/end", post(end))
        .route("/api/game/state", get(state))
        .route("/api/game/roll", post(roll))
        .route("/api/game/save", post(save))
        .route("/api/game/load", post(load))
        .route("/api/game/saves", get(saves))
        .route("/api/game/character", get(character))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct SessionStats {
    active_sessions: usize,
}

async fn session_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(SessionStats { active_sessions: state.sessions.len() })
}

#[derive(Deserialize)]
struct NewCharacterRequest {
    name: String,
    class: String,
    race: String,
}

#[derive(Deserialize)]
struct StartRequest {
    character: NewCharacterRequest,
    #[serde(default)]
    scenario_id: Option<String>,
}

#[derive(Serialize)]
struct StartResponse {
    session_id: Uuid,
    narration: String,
    state: StateView,
}

async fn start(State(state): State<AppState>, Json(body): Json<StartRequest>) -> Result<Json<StartResponse>, ApiError> {
    let scenario = match &body.scenario_id {
        Some(id) => state.catalog.scenario(id)?.clone(),
        None => state
            .catalog
            .default_scenario()
            .ok_or_else(|| ApiError::Internal("no bundled scenario available".to_string()))?
            .clone(),
    };

    let mut dice = match state.config.rng_seed {
        Some(seed) => Dice::from_seed(seed),
        None => Dice::from_entropy(),
    };
    let character = Character::create(&mut dice, &state.catalog, &body.character.name, &body.character.class, &body.character.race)?;

    let session = Session::new_with_seed(Arc::new(scenario), character, state.config.rng_seed);
    let location = session.location.current();
    let narration = location
        .enter_text
        .clone()
        .unwrap_or_else(|| location.description.clone());
    let state_snapshot = state_view(&session);
    let session_id = state.sessions.create(session);

    Ok(Json(StartResponse { session_id, narration, state: state_snapshot }))
}

#[derive(Deserialize)]
struct ActionRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    action: String,
}

#[derive(Serialize, Default)]
struct ActionResponse {
    narration: String,
    rolls: Vec<serde_json::Value>,
    combat_started: Option<Vec<String>>,
    warnings: Vec<String>,
    state: Option<StateView>,
}

async fn action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut session = entry.lock().await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let turn_result = state.pipeline.run_turn(&mut session, state.llm.as_ref(), &body.action, tx).await;

    let mut response = ActionResponse::default();
    while let Ok(event) = rx.try_recv() {
        fold_event(&mut response, event);
    }
    response.state = Some(state_view(&session));
    turn_result?;
    Ok(Json(response))
}

fn fold_event(response: &mut ActionResponse, event: TurnEvent) {
    match event {
        TurnEvent::Chunk { text } => response.narration.push_str(&text),
        TurnEvent::RollResult { .. } => {
            response.rolls.push(serde_json::to_value(&event).unwrap_or(serde_json::Value::Null));
        }
        TurnEvent::CombatStart { enemies } => response.combat_started = Some(enemies),
        TurnEvent::StateError { message } => response.warnings.push(message),
        TurnEvent::State { snapshot, .. } => {
            let _ = snapshot;
        }
        TurnEvent::Error { message } => response.warnings.push(message),
    }
}

async fn action_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ActionRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<TurnEvent>();

    tokio::spawn(async move {
        let mut session = entry.lock().await;
        if let Err(err) = state.pipeline.run_turn(&mut session, state.llm.as_ref(), &body.action, tx.clone()).await {
            let _ = tx.send(TurnEvent::Error { message: err.to_string() });
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let name = match &event {
            TurnEvent::Chunk { .. } => "chunk",
            TurnEvent::RollResult { .. } => "roll_result",
            TurnEvent::CombatStart { .. } => "combat_start",
            TurnEvent::StateError { .. } => "state_error",
            TurnEvent::State { .. } => "state",
            TurnEvent::Error { .. } => "error",
        };
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(name).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

async fn end(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    state.sessions.end(session_id)?;
    Ok(Json(serde_json::json!({ "ended": true })))
}

async fn state(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Query(query): axum::extract::Query<SessionIdQuery>,
) -> Result<Json<StateView>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(state_view(&session)))
}

#[derive(Deserialize)]
struct RollRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    notation: Option<String>,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    dc: Option<i32>,
}

#[derive(Serialize)]
struct RollResponse {
    notation: String,
    total: i64,
    success: Option<bool>,
}

async fn roll(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RollRequest>,
) -> Result<Json<RollResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut session = entry.lock().await;

    if let Some(skill) = &body.skill {
        let (_, ability) = hollowmere_tags::resolve_skill(skill).ok_or_else(|| bad_request(format!("unknown skill: {skill}")))?;
        let modifier = session
            .character
            .abilities
            .get(ability)
            .map(hollowmere_character::modifier)
            .unwrap_or(0)
            + session.character.proficiency_bonus();
        let check = session.dice.roll_d20(modifier as i64, hollowmere_dice::Advantage::Normal);
        let dc = body.dc.unwrap_or(10);
        return Ok(Json(RollResponse {
            notation: format!("1d20{modifier:+}"),
            total: check.total,
            success: Some(check.total >= dc as i64),
        }));
    }

    let notation = body.notation.as_deref().unwrap_or("1d20");
    let result = session.dice.roll(notation).map_err(|err| bad_request(err.to_string()))?;
    Ok(Json(RollResponse { notation: notation.to_string(), total: result.total, success: None }))
}

#[derive(Deserialize)]
struct SaveRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    slot: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct SaveResponse {
    filename: String,
}

async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;

    let name = sanitize_save_name(&body.slot);
    let description = body.description.unwrap_or_else(|| format!("{} at turn {}", session.character.name, session.turn));
    let save_file = SaveFile::from_session(&session, description);
    write_save(Path::new(&state.config.save_dir), &name, &save_file)?;
    Ok(Json(SaveResponse { filename: name }))
}

#[derive(Deserialize)]
struct LoadRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    filepath: String,
}

#[derive(Serialize)]
struct LoadResponse {
    session_id: Uuid,
    state: StateView,
}

async fn load(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoadRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let requested = resolve_session_id(&headers, body.session_id).ok();

    let save_file = read_save(Path::new(&state.config.save_dir), &body.filepath)?;
    let loaded = save_file.into_session(&state.catalog)?;
    let state_snapshot = state_view(&loaded);

    if let Some(old_id) = requested {
        let _ = state.sessions.end(old_id);
    }
    let session_id = state.sessions.create(loaded);

    Ok(Json(LoadResponse { session_id, state: state_snapshot }))
}

async fn saves(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(list_saves(Path::new(&state.config.save_dir))?))
}

async fn character(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Query(query): axum::extract::Query<SessionIdQuery>,
) -> Result<Json<views::CharacterView>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(views::character_view(&session)))
}
