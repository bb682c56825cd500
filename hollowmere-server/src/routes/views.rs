use serde::Serialize;

use hollowmere_content::DangerLevel;
use hollowmere_session::Session;

/// Wire view of a character: the stored fields plus the derived numbers
/// (armor class, proficiency bonus) a client shouldn't have to recompute.
#[derive(Debug, Serialize)]
pub struct CharacterView {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub xp: u32,
    pub abilities: hollowmere_character::Abilities,
    pub max_hp: i32,
    pub current_hp: i32,
    pub armor_class: i32,
    pub proficiency_bonus: i32,
    pub hit_dice_remaining: u32,
    pub weapon_id: Option<String>,
    pub armor_id: Option<String>,
    pub gold: u32,
    pub inventory: Vec<InventorySlotView>,
}

#[derive(Debug, Serialize)]
pub struct InventorySlotView {
    pub item_id: String,
    pub quantity: u32,
}

pub fn character_view(session: &Session) -> CharacterView {
    let character = &session.character;
    let armor_ac_bonus = character
        .armor_id
        .as_ref()
        .and_then(|id| session.scenario.items.get(id))
        .and_then(|item| item.ac_bonus)
        .unwrap_or(0);
    CharacterView {
        name: character.name.clone(),
        race: character.race.clone(),
        class: character.class.clone(),
        level: character.level,
        xp: character.xp,
        abilities: character.abilities,
        max_hp: character.max_hp,
        current_hp: character.current_hp,
        armor_class: character.armor_class(armor_ac_bonus),
        proficiency_bonus: character.proficiency_bonus(),
        hit_dice_remaining: character.hit_dice_remaining,
        weapon_id: character.weapon_id.clone(),
        armor_id: character.armor_id.clone(),
        gold: character.gold,
        inventory: character
            .inventory
            .slots()
            .iter()
            .map(|slot| InventorySlotView { item_id: slot.item_id.clone(), quantity: slot.quantity })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct LocationView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub atmosphere: String,
    pub danger_level: DangerLevel,
    pub dark: bool,
    pub exits: Vec<String>,
    pub npcs_present: Vec<String>,
    pub items: Vec<String>,
    pub first_visit: bool,
}

pub fn location_view(session: &Session) -> LocationView {
    let location = session.location.current();
    let npcs_present: Vec<String> = session
        .npcs
        .npcs_at(session.location.current_id(), &session.scenario)
        .into_iter()
        .map(|npc| npc.name.clone())
        .collect();
    LocationView {
        id: location.id.clone(),
        name: location.name.clone(),
        description: location.description.clone(),
        atmosphere: location.atmosphere.clone(),
        danger_level: location.danger_level,
        dark: location.dark,
        exits: session.location.get_exits().into_iter().map(|(dir, _)| dir).collect(),
        npcs_present,
        items: location.items.clone(),
        first_visit: !session.location.visited_location_ids().contains(&location.id),
    }
}

/// Full game-state snapshot returned by `/api/game/state` and echoed into
/// `/api/game/action`'s non-streaming response.
#[derive(Debug, Serialize)]
pub struct StateView {
    pub character: CharacterView,
    pub location: LocationView,
    pub turn: u32,
    pub in_combat: bool,
    pub game_flags: Vec<String>,
    pub party_size: usize,
}

pub fn state_view(session: &Session) -> StateView {
    StateView {
        character: character_view(session),
        location: location_view(session),
        turn: session.turn,
        in_combat: session.in_combat(),
        game_flags: session.game_flags.iter().cloned().collect(),
        party_size: session.party.len(),
    }
}
