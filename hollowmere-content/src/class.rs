use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static class table: hit die size, starting gear and gold. Consumed by
/// `hollowmere-character::create` when rolling a new character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: String,
    pub name: String,
    pub hit_die: u32,
    #[serde(default)]
    pub starting_items: Vec<(String, u32)>,
    #[serde(default)]
    pub starting_gold: u32,
    #[serde(default)]
    pub starting_weapon_id: Option<String>,
    #[serde(default)]
    pub starting_armor_id: Option<String>,
}

/// Static race table: flat modifiers applied to the six rolled abilities.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RaceDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ability_modifiers: HashMap<String, i32>,
}
