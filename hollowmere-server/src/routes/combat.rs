use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_combat::CombatState;

use crate::combat_ops::{has_light_source, resolve_until_player_turn, CombatSummary, CombatTurnLog};
use crate::error::ApiError;
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/combat/status", get(status))
        .route("/api/combat/attack", post(attack))
        .route("/api/combat/defend", post(defend))
        .route("/api/combat/flee", post(flee))
}

#[derive(Deserialize)]
struct SessionIdQuery {
    session_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct SessionIdBody {
    #[serde(default)]
    session_id: Option<Uuid>,
}

async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<Option<CombatState>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(session.combat.clone()))
}

#[derive(Serialize)]
struct TurnResolution {
    log: Vec<CombatTurnLog>,
    summary: Option<CombatSummary>,
    combat: Option<CombatState>,
}

#[derive(Deserialize)]
struct AttackRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    target_index: usize,
}

async fn attack(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AttackRequest>,
) -> Result<Json<TurnResolution>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    if session.combat.is_none() {
        return Err(ApiError::NotInCombat);
    }

    let location_dark = session.location.current().dark;
    let has_light = has_light_source(session);
    let weapon_dice = session
        .character
        .weapon_id
        .as_ref()
        .and_then(|id| session.scenario.items.get(id))
        .and_then(|item| item.damage_dice.clone())
        .unwrap_or_else(|| "1d4".to_string());
    let character = session.character.clone();

    let combat = session.combat.as_mut().ok_or(ApiError::NotInCombat)?;
    let attack_result = hollowmere_combat::player_attack(
        combat,
        &character,
        &weapon_dice,
        body.target_index,
        location_dark,
        has_light,
        &mut session.dice,
    )?;
    let mut log = vec![CombatTurnLog::Party {
        name: character.name.clone(),
        result: attack_result,
    }];

    let (mut enemy_log, summary) = resolve_until_player_turn(session);
    log.append(&mut enemy_log);

    Ok(Json(TurnResolution { log, summary, combat: session.combat.clone() }))
}

async fn defend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdBody>,
) -> Result<Json<TurnResolution>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    let combat = session.combat.as_mut().ok_or(ApiError::NotInCombat)?;
    hollowmere_combat::player_defend(combat);

    let (log, summary) = resolve_until_player_turn(session);
    Ok(Json(TurnResolution { log, summary, combat: session.combat.clone() }))
}

#[derive(Serialize)]
struct FleeResponse {
    success: bool,
    opportunity_damage: i32,
    log: Vec<CombatTurnLog>,
    summary: Option<CombatSummary>,
    combat: Option<CombatState>,
}

async fn flee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdBody>,
) -> Result<Json<FleeResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    let armor_ac_bonus = session
        .character
        .armor_id
        .as_ref()
        .and_then(|id| session.scenario.items.get(id))
        .and_then(|item| item.ac_bonus)
        .unwrap_or(0);
    let character_ac = session.character.armor_class(armor_ac_bonus);
    let character = session.character.clone();

    let combat = session.combat.as_ref().ok_or(ApiError::NotInCombat)?;
    let flee_result = hollowmere_combat::player_flee(combat, &character, character_ac, &mut session.dice);

    if flee_result.opportunity_damage > 0 {
        session.character.take_damage(flee_result.opportunity_damage);
    }

    let (log, summary) = if flee_result.success {
        session.combat = None;
        (Vec::new(), None)
    } else {
        resolve_until_player_turn(session)
    };

    Ok(Json(FleeResponse {
        success: flee_result.success,
        opportunity_damage: flee_result.opportunity_damage,
        log,
        summary,
        combat: session.combat.clone(),
    }))
}
