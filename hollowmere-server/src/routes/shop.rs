use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shop/browse", get(browse))
        .route("/api/shop/buy", post(buy))
        .route("/api/shop/sell", post(sell))
}

#[derive(Deserialize)]
struct BrowseQuery {
    session_id: Option<Uuid>,
    npc_id: String,
}

#[derive(Serialize)]
struct ShopListing {
    item_id: String,
    name: String,
    price: u32,
    in_stock: bool,
}

async fn browse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Vec<ShopListing>>, ApiError> {
    let session_id = resolve_session_id(&headers, query.session_id)?;
    let entry = state.session(session_id)?;
    let session = entry.lock().await;

    let npc = session
        .scenario
        .npcs
        .get(&query.npc_id)
        .ok_or_else(|| bad_request(format!("unknown npc: {}", query.npc_id)))?;
    let price_modifier = session.npcs.price_modifier(&query.npc_id).unwrap_or(1.0);

    let mut listings = Vec::new();
    for item_id in npc.shop_inventory.keys() {
        let Some(item) = session.scenario.items.get(item_id) else { continue };
        let price = ((item.value as f64) * npc.merchant_markup * price_modifier).round() as u32;
        let in_stock = session
            .npcs
            .stock_of(&query.npc_id, item_id)
            .map(|stock| !matches!(stock, hollowmere_content::Stock::Finite(0)))
            .unwrap_or(false);
        listings.push(ShopListing { item_id: item_id.clone(), name: item.name.clone(), price, in_stock });
    }
    listings.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    Ok(Json(listings))
}

#[derive(Deserialize)]
struct TradeRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    npc_id: String,
    item_id: String,
    #[serde(default = "default_qty")]
    quantity: u32,
}

fn default_qty() -> u32 {
    1
}

async fn buy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TradeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
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
    let item = session
        .scenario
        .items
        .get(&body.item_id)
        .cloned()
        .ok_or_else(|| bad_request(format!("unknown item: {}", body.item_id)))?;

    let receipt = hollowmere_shop::buy(&mut session.character, &mut session.npcs, &npc, &item, body.quantity)?;
    Ok(Json(serde_json::json!({
        "item_id": receipt.item_id,
        "quantity": receipt.quantity,
        "total_cost": receipt.total_cost,
        "gold_remaining": session.character.gold,
    })))
}

async fn sell(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TradeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
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
    let item = session
        .scenario
        .items
        .get(&body.item_id)
        .cloned()
        .ok_or_else(|| bad_request(format!("unknown item: {}", body.item_id)))?;

    let receipt = hollowmere_shop::sell(&mut session.character, &mut session.npcs, &npc, &item, body.quantity)?;
    Ok(Json(serde_json::json!({
        "item_id": receipt.item_id,
        "quantity": receipt.quantity,
        "total_payout": receipt.total_payout,
        "gold_remaining": session.character.gold,
    })))
}
