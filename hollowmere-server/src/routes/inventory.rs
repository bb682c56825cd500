use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hollowmere_content::OnUseEffect;

use crate::error::{bad_request, ApiError};
use crate::extract::resolve_session_id;
use crate::state::AppState;

use super::views::{character_view, CharacterView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inventory/use", post(use_item))
        .route("/api/inventory/equip", post(equip))
}

#[derive(Deserialize)]
struct UseItemRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    item_id: String,
}

#[derive(Serialize)]
struct UseItemResponse {
    consumed: bool,
    character: CharacterView,
}

async fn use_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UseItemRequest>,
) -> Result<Json<UseItemResponse>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut guard = entry.lock().await;
    let session = &mut *guard;

    if !session.character.inventory.has(&body.item_id) {
        return Err(bad_request(format!("you don't have {}", body.item_id)));
    }
    let item = session
        .scenario
        .items
        .get(&body.item_id)
        .cloned()
        .ok_or_else(|| bad_request(format!("unknown item: {}", body.item_id)))?;
    let Some(effect) = item.on_use_effect else {
        return Err(bad_request(format!("{} has no use effect", item.name)));
    };

    match effect {
        OnUseEffect::Heal { amount } => {
            session.character.heal(amount);
        }
        OnUseEffect::RestoreHitDie => {
            if session.character.hit_dice_remaining < session.character.level {
                session.character.hit_dice_remaining += 1;
            }
        }
        OnUseEffect::GrantLight => {}
    }
    session.character.inventory.remove(&body.item_id, 1);

    Ok(Json(UseItemResponse { consumed: true, character: character_view(session) }))
}

#[derive(Deserialize)]
struct EquipRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    item_id: String,
    item_type: String,
}

async fn equip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EquipRequest>,
) -> Result<Json<CharacterView>, ApiError> {
    let session_id = resolve_session_id(&headers, body.session_id)?;
    let entry = state.session(session_id)?;
    let mut session = entry.lock().await;
    session.character.equip(&body.item_id, &body.item_type)?;
    Ok(Json(character_view(&session)))
}
