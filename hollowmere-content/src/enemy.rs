use serde::{Deserialize, Serialize};

/// One entry in an enemy's loot table: an independent roll per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootEntry {
    pub item_id: String,
    pub drop_chance: f64,
    pub qty_min: u32,
    pub qty_max: u32,
}

/// Static enemy-type definition content authors reference from
/// `[COMBAT:]` tags and location `random_encounters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyType {
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub ac: i32,
    pub attack_bonus: i32,
    pub damage_dice: String,
    pub dex_mod: i32,
    pub xp_reward: u32,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub loot_table: Vec<LootEntry>,
    #[serde(default)]
    pub gold_min: u32,
    #[serde(default)]
    pub gold_max: u32,
}
