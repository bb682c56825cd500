use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLevel {
    Safe,
    Uneasy,
    Threatening,
    Deadly,
}

/// A requirement gating one exit direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitConditionKind {
    HasItem { item_id: String },
    Gold { amount: u32 },
    Visited { location_id: String },
    Skill { ability: String, dc: i32 },
    Objective { quest_id: String, objective_id: String },
    Flag { flag: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitCondition {
    #[serde(flatten)]
    pub kind: ExitConditionKind,
    pub fail_message: String,
    #[serde(default)]
    pub consume_item: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    OnEnter,
    OnFirstVisit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEvent {
    pub id: String,
    pub trigger: EventTrigger,
    pub text: String,
    #[serde(default)]
    pub one_time: bool,
    #[serde(default)]
    pub set_flag: Option<String>,
    #[serde(default)]
    pub grant_item: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomEncounter {
    pub id: String,
    pub enemies: Vec<String>,
    pub chance: f64,
    #[serde(default)]
    pub min_visits: u32,
    #[serde(default)]
    pub max_triggers: Option<u32>,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub surprise: bool,
}

/// Static, scenario-authored definition of a location. Per-session mutable
/// state (visit counts, triggered events, unlocked exits) lives in
/// `hollowmere-world`'s runtime tracker, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub atmosphere: String,
    #[serde(default)]
    pub enter_text: Option<String>,
    #[serde(default)]
    pub exits: HashMap<String, String>,
    #[serde(default)]
    pub direction_aliases: HashMap<String, String>,
    #[serde(default)]
    pub exit_conditions: HashMap<String, ExitCondition>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub npcs: Vec<String>,
    #[serde(default)]
    pub events: Vec<LocationEvent>,
    #[serde(default)]
    pub random_encounters: Vec<RandomEncounter>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub discovery_condition: Option<String>,
    #[serde(default)]
    pub discovery_hint: Option<String>,
    #[serde(default = "default_danger")]
    pub danger_level: DangerLevel,
    #[serde(default)]
    pub stealth_dc: Option<i32>,
    #[serde(default)]
    pub perception_dc: Option<i32>,
    #[serde(default)]
    pub dark: bool,
}

fn default_danger() -> DangerLevel {
    DangerLevel::Safe
}

/// Normalizes `n/s/e/w/ne/nw/se/sw/u/d` and their common spellings to the
/// canonical long-form direction used as an `exits` key.
pub fn canonical_direction(input: &str) -> String {
    match input.trim().to_ascii_lowercase().as_str() {
        "n" => "north",
        "s" => "south",
        "e" => "east",
        "w" => "west",
        "ne" => "northeast",
        "nw" => "northwest",
        "se" => "southeast",
        "sw" => "southwest",
        "u" => "up",
        "d" => "down",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_direction_maps_cardinal_aliases() {
        assert_eq!(canonical_direction("n"), "north");
        assert_eq!(canonical_direction("SW"), "southwest");
        assert_eq!(canonical_direction("d"), "down");
    }

    #[test]
    fn canonical_direction_passes_through_long_form() {
        assert_eq!(canonical_direction("north"), "north");
    }
}
