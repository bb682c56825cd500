use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_session::SessionContext;
use hollowmere_world::MoveOutcome;

use crate::error::ApiError;
use crate::extract::resolve_session_id;
use crate::state::AppState;

use super::views::{location_view, LocationView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(current))
        .route("/api/travel", post(travel))
        .route("/api/location/scan", post(scan))
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

async fn current(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionIdQuery>,
) -> Result<Json<LocationView>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;
    Ok(Json(location_view(&session)))
}

#[derive(Deserialize)]
struct TravelRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    direction: String,
    #[serde(default)]
    approach: Option<String>,
}

#[derive(Serialize)]
struct TravelResponse {
    outcome: MoveOutcome,
    location: LocationView,
}

async fn travel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TravelRequest>,
) -> Result<Json<TravelResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    if session.in_combat() {
        return Err(ApiError::TravelInCombat);
    }

    let ctx = SessionContext {
        game_flags: &session.game_flags,
        quests: &session.quests,
        visited_locations: &session.visited_locations,
        character: &session.character,
    };
    let outcome = session.location.move_direction(
        &body.direction,
        body.approach.as_deref(),
        &mut session.character,
        &mut session.dice,
        &ctx,
    )?;

    session.quests.tick_time_limits(&session.scenario, session.turn);
    session.refresh_visited_cache();

    Ok(Json(TravelResponse { outcome, location: location_view(session) }))
}

#[derive(Serialize)]
struct DiscoveredLocation {
    id: String,
    name: String,
}

async fn scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionIdBody>,
) -> Result<Json<Vec<DiscoveredLocation>>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    let candidates: Vec<String> = session
        .scenario
        .locations
        .values()
        .filter(|loc| loc.hidden && !session.location.discovered_secrets().contains(&loc.id))
        .map(|loc| loc.id.clone())
        .collect();

    let mut discovered = Vec::new();
    for location_id in candidates {
        if session.location.check_discovery(&location_id, &session.character, &mut session.dice) {
            session.location.mark_discovered(&location_id);
            if let Some(location) = session.scenario.locations.get(&location_id) {
                discovered.push(DiscoveredLocation { id: location.id.clone(), name: location.name.clone() });
            }
        }
    }
    discovered.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(discovered))
}
