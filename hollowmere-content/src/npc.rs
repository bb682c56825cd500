use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    Merchant,
    QuestGiver,
    Info,
    Hostile,
    Recruitable,
    Neutral,
}

/// Either a finite stock count or unlimited (`None` in TOML maps to infinite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stock {
    Finite(u32),
    Infinite,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TravelingMerchant {
    #[serde(default)]
    pub is_traveling: bool,
    #[serde(default)]
    pub spawn_chance: f64,
    #[serde(default)]
    pub possible_locations: Vec<String>,
    #[serde(default)]
    pub inventory_pool: Vec<String>,
    #[serde(default = "default_cooldown_turns")]
    pub cooldown_turns: u32,
}

fn default_cooldown_turns() -> u32 {
    10
}

/// Static combat stats for a recruitable NPC, consumed when it joins the
/// party. Only present on `role = "recruitable"` NPCs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyStats {
    pub class: String,
    pub level: u32,
    pub max_hp: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage_dice: String,
    #[serde(default)]
    pub dex_mod: i32,
    #[serde(default)]
    pub special_ability: Option<String>,
    #[serde(default)]
    pub ability_uses_per_combat: u32,
}

/// Static, scenario-authored NPC definition. Disposition, current stock, and
/// any traveling-merchant rotation state are per-session runtime data and
/// live in `hollowmere-npc`, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub description: String,
    pub role: NpcRole,
    pub location_id: String,
    #[serde(default)]
    pub dialogue: HashMap<String, String>,
    #[serde(default)]
    pub shop_inventory: HashMap<String, Stock>,
    #[serde(default = "default_markup")]
    pub merchant_markup: f64,
    #[serde(default)]
    pub traveling: Option<TravelingMerchant>,
    #[serde(default)]
    pub recruitment_location_id: Option<String>,
    #[serde(default)]
    pub recruitment_conditions: Vec<String>,
    #[serde(default)]
    pub party_stats: Option<PartyStats>,
}

fn default_markup() -> f64 {
    1.0
}
