use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChoiceRequirement {
    #[serde(default)]
    pub skill: Option<(String, i32)>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub gold: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub requirement: ChoiceRequirement,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub reputation_deltas: Vec<(String, i32)>,
    #[serde(default)]
    pub alignment_delta: i32,
    #[serde(default)]
    pub advance_quest: Option<String>,
    #[serde(default)]
    pub fail_quest: Option<String>,
}

/// A scenario-authored moral choice: a gate (trigger flag/location) plus a
/// fixed menu of options, each with optional requirements and consequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDef {
    pub id: String,
    pub trigger_flag: String,
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingDef {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub min_alignment: Option<i32>,
    #[serde(default)]
    pub max_alignment: Option<i32>,
    #[serde(default)]
    pub required_flags: Vec<String>,
}
