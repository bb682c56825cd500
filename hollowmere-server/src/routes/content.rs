use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use hollowmere_content::{ClassDef, RaceDef};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/classes", get(classes))
        .route("/api/races", get(races))
        .route("/api/scenarios", get(scenarios))
}

async fn classes(State(state): State<AppState>) -> Json<Vec<ClassDef>> {
    let mut classes: Vec<ClassDef> = state.catalog.classes.values().cloned().collect();
    classes.sort_by(|a, b| a.id.cmp(&b.id));
    Json(classes)
}

async fn races(State(state): State<AppState>) -> Json<Vec<RaceDef>> {
    let mut races: Vec<RaceDef> = state.catalog.races.values().cloned().collect();
    races.sort_by(|a, b| a.id.cmp(&b.id));
    Json(races)
}

#[derive(Serialize)]
struct ScenarioSummary {
    id: String,
    name: String,
}

async fn scenarios(State(state): State<AppState>) -> Json<Vec<ScenarioSummary>> {
    let mut scenarios: Vec<ScenarioSummary> = state
        .catalog
        .scenarios
        .values()
        .map(|s| ScenarioSummary { id: s.id.clone(), name: s.name.clone() })
        .collect();
    scenarios.sort_by(|a, b| a.id.cmp(&b.id));
    Json(scenarios)
}
