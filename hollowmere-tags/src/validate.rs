use hollowmere_content::{Npc, NpcRole, Scenario};
use hollowmere_npc::NpcRegistry;
use tracing::warn;

use crate::grammar::ParsedTag;
use crate::skills::resolve_skill;

/// Validates a batch of already-parsed tags against scenario content and the
/// player's current location, dropping anything that references content
/// that doesn't exist. `[ROLL:]` tags are rewritten with their canonical
/// skill name as a side effect of resolution.
pub fn validate_tags(
    tags: Vec<ParsedTag>,
    scenario: &Scenario,
    npcs: &NpcRegistry,
    location_id: &str,
) -> Vec<ParsedTag> {
    let present = npcs.npcs_at(location_id, scenario);
    tags.into_iter()
        .filter_map(|tag| validate_one(tag, scenario, &present))
        .collect()
}

fn validate_one(tag: ParsedTag, scenario: &Scenario, present: &[&Npc]) -> Option<ParsedTag> {
    match tag {
        ParsedTag::Roll { skill, dc } => match resolve_skill(&skill) {
            Some((canonical, _ability)) => Some(ParsedTag::Roll { skill: canonical.to_string(), dc }),
            None => {
                warn!(skill, "unresolvable skill name in ROLL tag, dropping");
                None
            }
        },
        ParsedTag::Combat { enemies, surprise } => {
            if enemies.iter().all(|id| scenario.enemies.contains_key(id)) {
                Some(ParsedTag::Combat { enemies, surprise })
            } else {
                warn!(?enemies, "combat tag references an unknown enemy type, dropping");
                None
            }
        }
        ParsedTag::Buy { item_id, price } => {
            if !scenario.items.contains_key(&item_id) {
                warn!(item_id, "buy tag references an unknown item, dropping");
                return None;
            }
            if present.is_empty() {
                warn!(item_id, "buy tag has no merchant present at this location, dropping");
                return None;
            }
            Some(ParsedTag::Buy { item_id, price })
        }
        ParsedTag::Pay { amount, reason } => {
            if present.is_empty() {
                warn!(amount, "pay tag has no NPC present at this location, dropping");
                return None;
            }
            Some(ParsedTag::Pay { amount, reason })
        }
        ParsedTag::Recruit { npc_id } => {
            if present
                .iter()
                .any(|npc| npc.id == npc_id && npc.role == NpcRole::Recruitable)
            {
                Some(ParsedTag::Recruit { npc_id })
            } else {
                warn!(npc_id, "recruit tag references an npc not recruitable here, dropping");
                None
            }
        }
        ParsedTag::Item { item_id } => {
            if scenario.items.contains_key(&item_id) {
                Some(ParsedTag::Item { item_id })
            } else {
                warn!(item_id, "item tag references an unknown item, dropping");
                None
            }
        }
        ParsedTag::Gold { amount } => Some(ParsedTag::Gold { amount }),
        ParsedTag::Xp { amount, reason } => Some(ParsedTag::Xp { amount, reason }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn scenario() -> Scenario {
        ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone()
    }

    #[test]
    fn roll_tag_remaps_alias_to_canonical_skill() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Roll { skill: "Lockpicking".to_string(), dc: 12 }];
        let validated = validate_tags(tags, &scenario, &npcs, "village_square");
        assert_eq!(validated, vec![ParsedTag::Roll { skill: "sleight_of_hand".to_string(), dc: 12 }]);
    }

    #[test]
    fn roll_tag_with_unresolvable_skill_is_dropped() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Roll { skill: "Juggling".to_string(), dc: 12 }];
        assert!(validate_tags(tags, &scenario, &npcs, "village_square").is_empty());
    }

    #[test]
    fn combat_tag_with_unknown_enemy_is_dropped() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Combat { enemies: vec!["dragon".to_string()], surprise: false }];
        assert!(validate_tags(tags, &scenario, &npcs, "village_square").is_empty());
    }

    #[test]
    fn combat_tag_with_known_enemy_passes() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Combat { enemies: vec!["goblin".to_string()], surprise: false }];
        assert_eq!(validate_tags(tags, &scenario, &npcs, "village_square").len(), 1);
    }

    #[test]
    fn recruit_tag_requires_recruitable_npc_present_at_location() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Recruit { npc_id: "elira".to_string() }];
        let validated = validate_tags(tags, &scenario, &npcs, "forest_clearing");
        assert_eq!(validated.len(), 1);
        let validated_elsewhere = validate_tags(
            vec![ParsedTag::Recruit { npc_id: "elira".to_string() }],
            &scenario,
            &npcs,
            "village_square",
        );
        assert!(validated_elsewhere.is_empty());
    }

    #[test]
    fn buy_tag_requires_item_to_exist_and_merchant_present() {
        let scenario = scenario();
        let npcs = NpcRegistry::new(&scenario);
        let tags = vec![ParsedTag::Buy { item_id: "healing_potion".to_string(), price: 20 }];
        assert!(validate_tags(tags.clone(), &scenario, &npcs, "village_square").is_empty());
    }
}
