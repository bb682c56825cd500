use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Per-session runtime state for one location. Content (`Location`) is
/// immutable; this is everything that changes as a session plays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRuntime {
    pub visited: bool,
    pub visit_count: u32,
    pub events_triggered: HashSet<String>,
    pub unlocked_exits: HashSet<String>,
    pub encounter_triggers: std::collections::HashMap<String, u32>,
    pub encounter_last_triggered_turn: std::collections::HashMap<String, u32>,
}
