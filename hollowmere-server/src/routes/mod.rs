mod character;
mod choices;
mod combat;
mod content;
mod game;
mod inventory;
mod locations;
mod party;
mod quests;
mod reputation;
mod shop;
mod views;

use axum::Router;

use crate::state::AppState;

/// Merges every feature module's router into the one the server binds.
/// Kept as a flat merge rather than nested `.nest()` calls: every route
/// already carries its own full `/api/...` path, and a flat merge keeps
/// route-not-found diagnostics pointing at the exact handler file.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(game::router())
        .merge(character::router())
        .merge(content::router())
        .merge(combat::router())
        .merge(inventory::router())
        .merge(shop::router())
        .merge(party::router())
        .merge(quests::router())
        .merge(locations::router())
        .merge(reputation::router())
        .merge(choices::router())
}
