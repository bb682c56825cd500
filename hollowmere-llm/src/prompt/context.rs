use serde::Serialize;

/// Everything the DM Context Builder needs to know about the player
/// character for one turn's prompt (§4.L section 2).
#[derive(Debug, Clone, Serialize)]
pub struct CharacterContext {
    pub name: String,
    pub class: String,
    pub race: String,
    pub level: u32,
    pub current_hp: i32,
    pub max_hp: i32,
    pub armor_class: i32,
    pub gold: u32,
    pub weapon: Option<String>,
    pub armor: Option<String>,
    pub status_effects: Vec<String>,
}

/// Location context (§4.L section 3).
#[derive(Debug, Clone, Serialize)]
pub struct LocationContext {
    pub name: String,
    pub description: String,
    pub atmosphere: String,
    pub exits: Vec<String>,
    pub npcs_present: Vec<String>,
    pub notable_items: Vec<String>,
}

/// One active quest and its next incomplete objective (§4.L section 4).
#[derive(Debug, Clone, Serialize)]
pub struct QuestContext {
    pub name: String,
    pub next_objective: Option<String>,
}

/// One line of prior conversation (§4.L section 5).
#[derive(Debug, Clone, Serialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// The full typed render context for one turn's prompt. Handlebars renders
/// each section template against this struct; Rust control flow (what to
/// include, in what order) never lives inside the template text itself.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub character: CharacterContext,
    pub location: LocationContext,
    pub quests: Vec<QuestContext>,
    pub history: Vec<HistoryTurn>,
    pub in_combat: bool,
    pub player_action: String,
}
