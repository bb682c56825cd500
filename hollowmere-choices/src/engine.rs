use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use hollowmere_character::{modifier, Character};
use hollowmere_content::{ChoiceDef, ChoiceOption, EndingDef, Scenario};
use hollowmere_dice::{Advantage, Dice};
use hollowmere_npc::NpcRegistry;
use hollowmere_quests::QuestTracker;

use crate::error::ChoiceError;

/// Effects of a resolved moral choice, applied by the caller to the pieces
/// of session state this crate doesn't own directly (flags live on the
/// session, not here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOutcome {
    pub choice_id: String,
    pub option_id: String,
    pub flags_set: Vec<String>,
    pub alignment_delta: i32,
}

/// Per-session moral-choice state: which choices have been resolved (and
/// with what option), plus a running alignment score that the ending
/// predictor reads. `ChoiceDef`/`ChoiceOption` content stays immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceManager {
    resolved: HashMap<String, String>,
    history: Vec<(String, String)>,
    alignment: i32,
}

impl ChoiceManager {
    pub fn new() -> Self {
        ChoiceManager::default()
    }

    pub fn alignment(&self) -> i32 {
        self.alignment
    }

    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    pub fn is_resolved(&self, choice_id: &str) -> bool {
        self.resolved.contains_key(choice_id)
    }

    /// Choices whose `trigger_flag` is set and that haven't been resolved
    /// yet, in scenario-authored order.
    pub fn available<'a>(
        &self,
        scenario: &'a Scenario,
        game_flags: &HashSet<String>,
    ) -> Vec<&'a ChoiceDef> {
        let mut choices: Vec<&ChoiceDef> = scenario
            .choices
            .values()
            .filter(|c| game_flags.contains(&c.trigger_flag) && !self.is_resolved(&c.id))
            .collect();
        choices.sort_by(|a, b| a.id.cmp(&b.id));
        choices
    }

    fn requirement_met(option: &ChoiceOption, character: &Character, dice: &mut Dice) -> bool {
        let req = &option.requirement;
        if let Some((ability, dc)) = &req.skill {
            let bonus =
                character.abilities.get(ability).map(modifier).unwrap_or(0) + character.proficiency_bonus();
            if dice.roll_d20(bonus as i64, Advantage::Normal).total < *dc as i64 {
                return false;
            }
        }
        if let Some(item_id) = &req.item_id {
            if !character.inventory.has(item_id) {
                return false;
            }
        }
        if let Some(gold) = req.gold {
            if character.gold < gold {
                return false;
            }
        }
        true
    }

    /// Resolves `choice_id` by picking `option_id`. Records it in history,
    /// applies the reputation deltas directly to `npcs`, routes
    /// `advance_quest`/`fail_quest` through the quest tracker, and returns
    /// the flags/alignment the session must still apply.
    #[allow(clippy::too_many_arguments)]
    pub fn select(
        &mut self,
        scenario: &Scenario,
        choice_id: &str,
        option_id: &str,
        character: &Character,
        dice: &mut Dice,
        npcs: &mut NpcRegistry,
        quests: &mut QuestTracker,
        current_turn: u32,
    ) -> Result<ChoiceOutcome, ChoiceError> {
        let choice = scenario
            .choices
            .get(choice_id)
            .ok_or_else(|| ChoiceError::UnknownChoice(choice_id.to_string()))?;
        if self.is_resolved(choice_id) {
            return Err(ChoiceError::AlreadyResolved(choice_id.to_string()));
        }
        let option = choice
            .options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| ChoiceError::UnknownOption {
                choice: choice_id.to_string(),
                option: option_id.to_string(),
            })?;
        if !Self::requirement_met(option, character, dice) {
            return Err(ChoiceError::RequirementNotMet {
                choice: choice_id.to_string(),
                option: option_id.to_string(),
            });
        }

        for (npc_id, delta) in &option.reputation_deltas {
            let _ = npcs.modify_disposition(npc_id, *delta);
        }
        if let Some(quest_id) = &option.advance_quest {
            if quests.status(quest_id) == hollowmere_quests::QuestStatus::NotStarted {
                let _ = quests.accept(scenario, quest_id, current_turn);
            }
        }
        if let Some(quest_id) = &option.fail_quest {
            quests.fail(quest_id);
        }

        self.alignment += option.alignment_delta;
        self.resolved.insert(choice_id.to_string(), option_id.to_string());
        self.history.push((choice_id.to_string(), option_id.to_string()));

        info!(choice = choice_id, option = option_id, alignment = self.alignment, "choice resolved");

        Ok(ChoiceOutcome {
            choice_id: choice_id.to_string(),
            option_id: option_id.to_string(),
            flags_set: option.set_flags.clone(),
            alignment_delta: option.alignment_delta,
        })
    }

    /// Maps current alignment and flags to the first scenario-authored
    /// ending whose bounds and required flags are all satisfied. `None` if
    /// no ending matches yet (the story isn't over).
    pub fn predict_ending<'a>(
        &self,
        scenario: &'a Scenario,
        game_flags: &HashSet<String>,
    ) -> Option<&'a EndingDef> {
        scenario.endings.iter().find(|ending| {
            let above_min = ending.min_alignment.is_none_or(|min| self.alignment >= min);
            let below_max = ending.max_alignment.is_none_or(|max| self.alignment <= max);
            let flags_met = ending.required_flags.iter().all(|f| game_flags.contains(f));
            above_min && below_max && flags_met
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn scenario() -> Scenario {
        let mut scenario = ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone();
        scenario.choices.insert(
            "spare_the_goblins".to_string(),
            ChoiceDef {
                id: "spare_the_goblins".to_string(),
                trigger_flag: "goblin_camp_cleared".to_string(),
                prompt: "The surviving goblins beg for mercy. What do you do?".to_string(),
                options: vec![
                    ChoiceOption {
                        id: "spare".to_string(),
                        text: "Let them flee.".to_string(),
                        requirement: Default::default(),
                        set_flags: vec!["spared_goblins".to_string()],
                        reputation_deltas: vec![],
                        alignment_delta: 10,
                        advance_quest: None,
                        fail_quest: None,
                    },
                    ChoiceOption {
                        id: "finish".to_string(),
                        text: "Finish them off.".to_string(),
                        requirement: Default::default(),
                        set_flags: vec!["finished_goblins".to_string()],
                        reputation_deltas: vec![],
                        alignment_delta: -10,
                        advance_quest: None,
                        fail_quest: None,
                    },
                ],
            },
        );
        scenario
    }

    fn character() -> Character {
        let mut dice = Dice::from_seed(1);
        Character::create(&mut dice, &ContentCatalog::bundled(), "Rowan", "fighter", "human").unwrap()
    }

    #[test]
    fn choice_not_available_until_trigger_flag_set() {
        let scenario = scenario();
        let manager = ChoiceManager::new();
        let flags = HashSet::new();
        assert!(manager.available(&scenario, &flags).is_empty());
    }

    #[test]
    fn choice_available_once_trigger_flag_set() {
        let scenario = scenario();
        let manager = ChoiceManager::new();
        let mut flags = HashSet::new();
        flags.insert("goblin_camp_cleared".to_string());
        let available = manager.available(&scenario, &flags);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "spare_the_goblins");
    }

    #[test]
    fn select_records_history_and_alignment() {
        let scenario = scenario();
        let mut manager = ChoiceManager::new();
        let character = character();
        let mut dice = Dice::from_seed(1);
        let mut npcs = NpcRegistry::new(&scenario);
        let mut quests = QuestTracker::new(&scenario);
        let outcome = manager
            .select(&scenario, "spare_the_goblins", "spare", &character, &mut dice, &mut npcs, &mut quests, 10)
            .unwrap();
        assert_eq!(outcome.flags_set, vec!["spared_goblins".to_string()]);
        assert_eq!(manager.alignment(), 10);
        assert!(manager.is_resolved("spare_the_goblins"));
    }

    #[test]
    fn select_twice_is_rejected() {
        let scenario = scenario();
        let mut manager = ChoiceManager::new();
        let character = character();
        let mut dice = Dice::from_seed(1);
        let mut npcs = NpcRegistry::new(&scenario);
        let mut quests = QuestTracker::new(&scenario);
        manager
            .select(&scenario, "spare_the_goblins", "spare", &character, &mut dice, &mut npcs, &mut quests, 10)
            .unwrap();
        let err = manager
            .select(&scenario, "spare_the_goblins", "finish", &character, &mut dice, &mut npcs, &mut quests, 10)
            .unwrap_err();
        assert_eq!(err, ChoiceError::AlreadyResolved("spare_the_goblins".to_string()));
    }

    #[test]
    fn predict_ending_honors_alignment_and_flags() {
        let scenario = scenario();
        let mut manager = ChoiceManager::new();
        let character = character();
        let mut dice = Dice::from_seed(1);
        let mut npcs = NpcRegistry::new(&scenario);
        let mut quests = QuestTracker::new(&scenario);
        manager
            .select(&scenario, "spare_the_goblins", "spare", &character, &mut dice, &mut npcs, &mut quests, 10)
            .unwrap();
        let mut flags: HashSet<String> = HashSet::new();
        flags.insert("lily_rescued".to_string());
        let ending = manager.predict_ending(&scenario, &flags).unwrap();
        assert_eq!(ending.id, "hero_of_the_village");
    }

    #[test]
    fn predict_ending_none_when_nothing_matches() {
        let scenario = scenario();
        let manager = ChoiceManager::new();
        let flags = HashSet::new();
        assert!(manager.predict_ending(&scenario, &flags).is_none());
    }
}
