use serde::{Deserialize, Serialize};

use hollowmere_content::EnemyType;
use hollowmere_dice::Dice;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LootResult {
    pub gold: u32,
    pub items: Vec<(String, u32)>,
}

/// Rolls gold (uniform in `[gold_min, gold_max]`) and each loot table entry
/// independently against its own `drop_chance`.
pub fn roll_loot(enemy: &EnemyType, dice: &mut Dice) -> LootResult {
    let gold = if enemy.gold_max > enemy.gold_min {
        enemy.gold_min + dice.pick_index((enemy.gold_max - enemy.gold_min + 1) as usize) as u32
    } else {
        enemy.gold_min
    };

    let mut items = Vec::new();
    for entry in &enemy.loot_table {
        if dice.chance(entry.drop_chance) {
            let qty = if entry.qty_max > entry.qty_min {
                entry.qty_min + dice.pick_index((entry.qty_max - entry.qty_min + 1) as usize) as u32
            } else {
                entry.qty_min
            };
            items.push((entry.item_id.clone(), qty));
        }
    }
    LootResult { gold, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::{ContentCatalog, Scenario};

    fn scenario() -> Scenario {
        ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone()
    }

    #[test]
    fn boss_loot_table_always_drops_at_full_chance() {
        let boss = scenario().enemies.get("goblin_boss").unwrap().clone();
        let mut dice = Dice::from_seed(1);
        let loot = roll_loot(&boss, &mut dice);
        assert_eq!(loot.items, vec![("chieftain_ring".to_string(), 1)]);
        assert!((boss.gold_min..=boss.gold_max).contains(&loot.gold));
    }

    #[test]
    fn gold_stays_within_configured_range() {
        let goblin = scenario().enemies.get("goblin").unwrap().clone();
        let mut dice = Dice::from_seed(2);
        for _ in 0..50 {
            let loot = roll_loot(&goblin, &mut dice);
            assert!((goblin.gold_min..=goblin.gold_max).contains(&loot.gold));
        }
    }
}
