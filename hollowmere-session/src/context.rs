use std::collections::HashSet;

use hollowmere_character::{modifier, Character};
use hollowmere_npc::RecruitmentContext;
use hollowmere_quests::QuestTracker;
use hollowmere_world::ConditionContext;

/// Bridges a [`crate::session::Session`]'s owned state to the context
/// traits that `hollowmere-world` and `hollowmere-npc` need but can't depend
/// on directly (doing so would put the quest/flag-owning session crate
/// underneath them in the dependency graph). Built fresh for each call site
/// from borrows, never stored.
pub struct SessionContext<'a> {
    pub game_flags: &'a HashSet<String>,
    pub quests: &'a QuestTracker,
    pub visited_locations: &'a HashSet<String>,
    pub character: &'a Character,
}

impl ConditionContext for SessionContext<'_> {
    fn has_flag(&self, flag: &str) -> bool {
        self.game_flags.contains(flag)
    }

    fn objective_complete(&self, quest_id: &str, objective_id: &str) -> bool {
        self.quests.is_objective_complete(quest_id, objective_id)
    }

    fn has_visited(&self, location_id: &str) -> bool {
        self.visited_locations.contains(location_id)
    }
}

impl RecruitmentContext for SessionContext<'_> {
    fn ability_score(&self, ability: &str) -> i32 {
        self.character.abilities.get(ability).map(modifier).unwrap_or(0)
    }

    fn has_item(&self, item_id: &str) -> bool {
        self.character.inventory.has(item_id)
    }

    fn gold(&self) -> u32 {
        self.character.gold
    }

    fn objective_complete(&self, quest_id: &str, objective_id: &str) -> bool {
        self.quests.is_objective_complete(quest_id, objective_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;
    use hollowmere_dice::Dice;

    #[test]
    fn forwards_flags_and_visits() {
        let catalog = ContentCatalog::bundled();
        let mut dice = Dice::from_seed(1);
        let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
        let scenario = catalog.scenario("goblin_cave").unwrap();
        let quests = QuestTracker::new(scenario);
        let mut flags = HashSet::new();
        flags.insert("met_gavin".to_string());
        let mut visited = HashSet::new();
        visited.insert("cave_entrance".to_string());

        let ctx = SessionContext {
            game_flags: &flags,
            quests: &quests,
            visited_locations: &visited,
            character: &character,
        };

        assert!(ctx.has_flag("met_gavin"));
        assert!(!ctx.has_flag("unseen_flag"));
        assert!(ctx.has_visited("cave_entrance"));
        assert!(!ctx.has_visited("deep_chamber"));
        assert_eq!(RecruitmentContext::gold(&ctx), character.gold);
    }
}
