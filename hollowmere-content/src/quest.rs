use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Main,
    Side,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    Kill,
    FindItem,
    TalkTo,
    ReachLocation,
    Collect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveDef {
    pub id: String,
    pub kind: ObjectiveKind,
    pub target: String,
    #[serde(default = "default_required")]
    pub required: u32,
    #[serde(default)]
    pub optional: bool,
    pub description: String,
}

fn default_required() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestRewards {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Static quest definition. Runtime objective progress and status live in
/// `hollowmere-quests`'s per-session tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub giver_npc_id: String,
    pub objectives: Vec<ObjectiveDef>,
    #[serde(default)]
    pub rewards: QuestRewards,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub time_limit_turns: Option<u32>,
}
