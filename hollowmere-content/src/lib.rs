//! Immutable scenario content: locations, NPCs, items, quests, enemies, and
//! moral choices, loaded once at startup from TOML bundles and referenced by
//! stable string ID everywhere else. Nothing in this crate is ever mutated
//! after load; per-session progress belongs to the subsystem crates.

pub mod catalog;
pub mod choice;
pub mod class;
pub mod enemy;
pub mod error;
pub mod item;
pub mod location;
pub mod npc;
pub mod quest;
pub mod scenario;

pub use catalog::ContentCatalog;
pub use choice::{ChoiceDef, ChoiceOption, ChoiceRequirement, EndingDef};
pub use class::{ClassDef, RaceDef};
pub use enemy::{EnemyType, LootEntry};
pub use error::ContentError;
pub use item::{Item, ItemType, OnUseEffect, Rarity};
pub use location::{
    canonical_direction, DangerLevel, EventTrigger, ExitCondition, ExitConditionKind, Location,
    LocationEvent, RandomEncounter,
};
pub use npc::{Npc, NpcRole, PartyStats, Stock, TravelingMerchant};
pub use quest::{ObjectiveDef, ObjectiveKind, QuestDef, QuestRewards, QuestType};
pub use scenario::Scenario;
