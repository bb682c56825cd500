use std::collections::HashSet;

use hollowmere_character::Character;
use hollowmere_content::ExitConditionKind;
use hollowmere_dice::{Advantage, Dice};

/// Everything outside the location graph itself that an exit condition or a
/// discovery probe might need to query. Implemented by the session crate so
/// `hollowmere-world` never depends on the quest/flag-owning types directly.
pub trait ConditionContext {
    fn has_flag(&self, flag: &str) -> bool;
    fn objective_complete(&self, quest_id: &str, objective_id: &str) -> bool;
    fn has_visited(&self, location_id: &str) -> bool;
}

/// A no-op context for callers (tests, tools) that only need item/gold/skill
/// checks and never reference flags or quest objectives.
pub struct NullContext;

impl ConditionContext for NullContext {
    fn has_flag(&self, _flag: &str) -> bool {
        false
    }
    fn objective_complete(&self, _quest_id: &str, _objective_id: &str) -> bool {
        false
    }
    fn has_visited(&self, _location_id: &str) -> bool {
        false
    }
}

/// Evaluates one exit condition against the character's current state.
/// Returns `Ok(())` on success or `Err(fail_message)` on failure.
pub fn evaluate(
    kind: &ExitConditionKind,
    character: &Character,
    dice: &mut Dice,
    ctx: &dyn ConditionContext,
) -> Result<(), ()> {
    let ok = match kind {
        ExitConditionKind::HasItem { item_id } => character.inventory.has(item_id),
        ExitConditionKind::Gold { amount } => character.gold >= *amount,
        ExitConditionKind::Visited { location_id } => ctx.has_visited(location_id),
        ExitConditionKind::Skill { ability, dc } => {
            let modifier = character
                .abilities
                .get(ability)
                .map(hollowmere_character::modifier)
                .unwrap_or(0)
                + character.proficiency_bonus();
            let result = dice.roll_d20(modifier, Advantage::Normal);
            result.total >= *dc
        }
        ExitConditionKind::Objective {
            quest_id,
            objective_id,
        } => ctx.objective_complete(quest_id, objective_id),
        ExitConditionKind::Flag { flag } => ctx.has_flag(flag),
    };
    if ok {
        Ok(())
    } else {
        Err(())
    }
}

/// Evaluates a scenario `discovery_condition` string of the form
/// `skill:<ability>:<dc>`, `has_item:<id>`, `level:<n>`, or
/// `visited:<loc_id>`.
pub fn check_discovery(
    condition: &str,
    character: &Character,
    dice: &mut Dice,
    visited_locations: &HashSet<String>,
) -> bool {
    let mut parts = condition.splitn(3, ':');
    let kind = parts.next().unwrap_or_default();
    match kind {
        "skill" => {
            let ability = parts.next().unwrap_or_default();
            let dc: i32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(i32::MAX);
            let modifier = character
                .abilities
                .get(ability)
                .map(hollowmere_character::modifier)
                .unwrap_or(0)
                + character.proficiency_bonus();
            dice.roll_d20(modifier, Advantage::Normal).total >= dc
        }
        "has_item" => {
            let item_id = parts.next().unwrap_or_default();
            character.inventory.has(item_id)
        }
        "level" => {
            let n: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(u32::MAX);
            character.level >= n
        }
        "visited" => {
            let location_id = parts.next().unwrap_or_default();
            visited_locations.contains(location_id)
        }
        _ => false,
    }
}
