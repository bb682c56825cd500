use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use hollowmere_character::Character;
use hollowmere_content::{ObjectiveKind, QuestDef, Scenario};
use hollowmere_npc::NpcRegistry;

use crate::error::QuestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    NotStarted,
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ObjectiveProgress {
    count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestProgress {
    status: QuestStatus,
    objectives: HashMap<String, ObjectiveProgress>,
    turn_accepted: Option<u32>,
}

impl Default for QuestProgress {
    fn default() -> Self {
        QuestProgress {
            status: QuestStatus::NotStarted,
            objectives: HashMap::new(),
            turn_accepted: None,
        }
    }
}

/// Per-session objective progress and status for every quest in the
/// scenario. `QuestDef` itself (giver, objectives, rewards) stays immutable
/// content; this tracker is the only thing that changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestTracker {
    progress: HashMap<String, QuestProgress>,
}

impl QuestTracker {
    pub fn new(scenario: &Scenario) -> Self {
        let progress = scenario
            .quests
            .keys()
            .map(|id| (id.clone(), QuestProgress::default()))
            .collect();
        QuestTracker { progress }
    }

    pub fn status(&self, quest_id: &str) -> QuestStatus {
        self.progress
            .get(quest_id)
            .map(|p| p.status)
            .unwrap_or(QuestStatus::NotStarted)
    }

    /// Accepts `quest_id` at `current_turn` if every entry in
    /// `quest.prerequisites` is already `Completed`.
    pub fn accept(
        &mut self,
        scenario: &Scenario,
        quest_id: &str,
        current_turn: u32,
    ) -> Result<(), QuestError> {
        let quest = scenario
            .quests
            .get(quest_id)
            .ok_or_else(|| QuestError::UnknownQuest(quest_id.to_string()))?;

        match self.status(quest_id) {
            QuestStatus::Active => return Err(QuestError::AlreadyAccepted(quest_id.to_string())),
            QuestStatus::Completed => return Err(QuestError::AlreadyCompleted(quest_id.to_string())),
            _ => {}
        }

        if !quest
            .prerequisites
            .iter()
            .all(|id| self.status(id) == QuestStatus::Completed)
        {
            return Err(QuestError::PrerequisitesNotMet(quest_id.to_string()));
        }

        let entry = self.progress.entry(quest_id.to_string()).or_default();
        entry.status = QuestStatus::Active;
        entry.turn_accepted = Some(current_turn);
        info!(quest = quest_id, "quest accepted");
        Ok(())
    }

    /// Called by every subsystem that can advance an objective: combat on a
    /// kill, inventory on find/collect, NPC dialogue on talk_to, the
    /// location engine on reach_location.
    pub fn check_objective(
        &mut self,
        scenario: &Scenario,
        kind: ObjectiveKind,
        target_id: &str,
        count: u32,
    ) {
        for quest in scenario.quests.values() {
            if self.status(&quest.id) != QuestStatus::Active {
                continue;
            }
            for objective in &quest.objectives {
                if objective.kind != kind || objective.target != target_id {
                    continue;
                }
                let progress = self
                    .progress
                    .entry(quest.id.clone())
                    .or_default()
                    .objectives
                    .entry(objective.id.clone())
                    .or_default();
                progress.count = (progress.count + count).min(objective.required);
            }
        }
    }

    fn objective_complete(&self, quest: &QuestDef, objective_id: &str) -> bool {
        let Some(objective) = quest.objectives.iter().find(|o| o.id == objective_id) else {
            return false;
        };
        self.progress
            .get(&quest.id)
            .and_then(|p| p.objectives.get(objective_id))
            .map(|progress| progress.count >= objective.required)
            .unwrap_or(false)
    }

    pub fn is_objective_complete(&self, quest_id: &str, objective_id: &str) -> bool {
        // Used by `hollowmere_npc::RecruitmentContext` and the choice
        // engine's condition evaluators; tolerant of unknown quest ids.
        self.progress.contains_key(quest_id)
            && self
                .progress
                .get(quest_id)
                .and_then(|p| p.objectives.get(objective_id))
                .map(|p| p.count > 0)
                .unwrap_or(false)
    }

    fn all_required_complete(&self, quest: &QuestDef) -> bool {
        quest
            .objectives
            .iter()
            .filter(|o| !o.optional)
            .all(|o| self.objective_complete(quest, &o.id))
    }

    /// Completes `quest_id`: requires every non-optional objective complete.
    /// Grants gold, routes XP through `Character::gain_xp`, adds reward
    /// items, and raises the giver NPC's disposition.
    pub fn complete(
        &mut self,
        scenario: &Scenario,
        quest_id: &str,
        character: &mut Character,
        npcs: &mut NpcRegistry,
    ) -> Result<(), QuestError> {
        let quest = scenario
            .quests
            .get(quest_id)
            .ok_or_else(|| QuestError::UnknownQuest(quest_id.to_string()))?;

        match self.status(quest_id) {
            QuestStatus::Completed => return Err(QuestError::AlreadyCompleted(quest_id.to_string())),
            QuestStatus::Failed => return Err(QuestError::Expired(quest_id.to_string())),
            QuestStatus::NotStarted => return Err(QuestError::NotAccepted(quest_id.to_string())),
            QuestStatus::Active => {}
        }

        if !self.all_required_complete(quest) {
            return Err(QuestError::ObjectivesIncomplete(quest_id.to_string()));
        }

        character.gold += quest.rewards.gold;
        if quest.rewards.xp > 0 {
            character.gain_xp(quest.rewards.xp, quest_id);
        }
        for item_id in &quest.rewards.items {
            let stackable = scenario
                .items
                .get(item_id)
                .map(|item| item.stackable)
                .unwrap_or(false);
            character.add_item(item_id, 1, stackable);
        }
        let _ = npcs.quest_completed(&quest.giver_npc_id, quest.quest_type);

        self.progress.entry(quest_id.to_string()).or_default().status = QuestStatus::Completed;
        info!(quest = quest_id, "quest completed");
        Ok(())
    }

    /// Forces `quest_id` to `Failed`, e.g. when a moral choice forecloses it.
    /// No-op if the quest was never started or already resolved.
    pub fn fail(&mut self, quest_id: &str) {
        if let Some(progress) = self.progress.get_mut(quest_id) {
            if progress.status == QuestStatus::Active || progress.status == QuestStatus::NotStarted {
                progress.status = QuestStatus::Failed;
                info!(quest = quest_id, "quest forced to failed");
            }
        }
    }

    /// Marks any active quest whose `time_limit_turns` has elapsed since
    /// acceptance as `Failed`.
    pub fn tick_time_limits(&mut self, scenario: &Scenario, current_turn: u32) {
        for quest in scenario.quests.values() {
            let Some(limit) = quest.time_limit_turns else {
                continue;
            };
            let Some(progress) = self.progress.get_mut(&quest.id) else {
                continue;
            };
            if progress.status != QuestStatus::Active {
                continue;
            }
            if let Some(started) = progress.turn_accepted {
                if current_turn.saturating_sub(started) > limit {
                    progress.status = QuestStatus::Failed;
                    info!(quest = %quest.id, "quest expired");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;
    use hollowmere_dice::Dice;

    fn scenario() -> Scenario {
        ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone()
    }

    fn character() -> Character {
        let mut dice = Dice::from_seed(1);
        Character::create(&mut dice, &ContentCatalog::bundled(), "Rowan", "fighter", "human").unwrap()
    }

    #[test]
    fn accept_then_complete_after_objectives_met() {
        let scenario = scenario();
        let mut tracker = QuestTracker::new(&scenario);
        let mut character = character();
        let mut npcs = NpcRegistry::new(&scenario);

        tracker.accept(&scenario, "rescue_lily_main", 0).unwrap();
        tracker.check_objective(&scenario, ObjectiveKind::ReachLocation, "goblin_camp_main", 1);
        tracker.check_objective(&scenario, ObjectiveKind::TalkTo, "lily", 1);

        let gold_before = character.gold;
        tracker
            .complete(&scenario, "rescue_lily_main", &mut character, &mut npcs)
            .unwrap();
        assert_eq!(tracker.status("rescue_lily_main"), QuestStatus::Completed);
        assert_eq!(character.gold, gold_before + 50);
    }

    #[test]
    fn complete_fails_when_objectives_incomplete() {
        let scenario = scenario();
        let mut tracker = QuestTracker::new(&scenario);
        let mut character = character();
        let mut npcs = NpcRegistry::new(&scenario);

        tracker.accept(&scenario, "rescue_lily_main", 0).unwrap();
        assert!(matches!(
            tracker.complete(&scenario, "rescue_lily_main", &mut character, &mut npcs),
            Err(QuestError::ObjectivesIncomplete(_))
        ));
    }

    #[test]
    fn cannot_accept_twice() {
        let scenario = scenario();
        let mut tracker = QuestTracker::new(&scenario);
        tracker.accept(&scenario, "rescue_lily_main", 0).unwrap();
        assert!(matches!(
            tracker.accept(&scenario, "rescue_lily_main", 1),
            Err(QuestError::AlreadyAccepted(_))
        ));
    }

    #[test]
    fn unknown_quest_errors() {
        let scenario = scenario();
        let mut tracker = QuestTracker::new(&scenario);
        assert!(matches!(
            tracker.accept(&scenario, "no_such_quest", 0),
            Err(QuestError::UnknownQuest(_))
        ));
    }
}
