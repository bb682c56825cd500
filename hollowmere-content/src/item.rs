use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Consumable,
    Quest,
    Misc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Static, immutable definition of an item. Quantities and ownership live in
/// a character's inventory, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default = "default_rarity")]
    pub rarity: Rarity,
    pub value: u32,
    #[serde(default)]
    pub stackable: bool,
    pub damage_dice: Option<String>,
    pub ac_bonus: Option<i32>,
    pub on_use_effect: Option<OnUseEffect>,
}

fn default_rarity() -> Rarity {
    Rarity::Common
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OnUseEffect {
    Heal { amount: i32 },
    RestoreHitDie,
    GrantLight,
}
