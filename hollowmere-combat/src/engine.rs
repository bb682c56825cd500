use std::collections::HashMap;

use tracing::info;

use hollowmere_character::{modifier, Character};
use hollowmere_content::Scenario;
use hollowmere_dice::{Advantage, Dice};
use hollowmere_npc::{Party, PartyMember};

use crate::error::CombatError;
use crate::state::{Combatant, CombatOutcome, CombatState, EnemyInstance, InitiativeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResult {
    pub hit: bool,
    pub crit: bool,
    pub damage: i32,
    pub target_defeated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleeResult {
    pub success: bool,
    pub opportunity_damage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTurnResult {
    pub target: Combatant,
    pub hit: bool,
    pub crit: bool,
    pub damage: i32,
}

/// True when the attacker should roll at disadvantage: the location is dark
/// and the attacker carries no light source.
pub fn check_darkness_penalty(location_dark: bool, has_light_source: bool) -> bool {
    location_dark && !has_light_source
}

fn ordinal_name(base: &str, index: usize, total_of_kind: usize) -> String {
    if total_of_kind <= 1 {
        base.to_string()
    } else {
        format!("{base} #{}", index + 1)
    }
}

/// Builds the encounter, rolls initiative (PC / party / enemies, ties broken
/// PC > party > enemies), and applies `SURPRISE` bookkeeping.
pub fn start_combat(
    scenario: &Scenario,
    enemy_type_ids: &[String],
    surprise: bool,
    character: &Character,
    party: &Party,
    dice: &mut Dice,
) -> Result<CombatState, CombatError> {
    if enemy_type_ids.is_empty() {
        return Err(CombatError::EmptyEncounter);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in enemy_type_ids {
        *counts.entry(id.as_str()).or_default() += 1;
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut enemies = Vec::with_capacity(enemy_type_ids.len());
    for id in enemy_type_ids {
        let enemy_type = scenario
            .enemies
            .get(id)
            .ok_or_else(|| CombatError::UnknownEnemyType(id.clone()))?;
        let idx = *seen.entry(id.as_str()).and_modify(|n| *n += 1).or_insert(0);
        enemies.push(EnemyInstance {
            enemy_type_id: enemy_type.id.clone(),
            name: ordinal_name(&enemy_type.name, idx, counts[id.as_str()]),
            current_hp: enemy_type.hp,
            max_hp: enemy_type.hp,
            ac: enemy_type.ac,
            attack_bonus: enemy_type.attack_bonus,
            damage_dice: enemy_type.damage_dice.clone(),
            dex_mod: enemy_type.dex_mod,
            is_boss: enemy_type.is_boss,
            xp_reward: enemy_type.xp_reward,
            surprised: surprise,
        });
    }

    let mut initiative = Vec::new();
    let pc_dex = modifier(character.abilities.dexterity) as i64;
    initiative.push(InitiativeEntry {
        combatant: Combatant::Player,
        roll: dice.roll_d20(pc_dex, Advantage::Normal).total,
    });
    for (i, member) in party.members().iter().enumerate() {
        initiative.push(InitiativeEntry {
            combatant: Combatant::Party(i),
            roll: dice.roll_d20(member.dex_mod as i64, Advantage::Normal).total,
        });
    }
    for (i, enemy) in enemies.iter().enumerate() {
        initiative.push(InitiativeEntry {
            combatant: Combatant::Enemy(i),
            roll: dice.roll_d20(enemy.dex_mod as i64, Advantage::Normal).total,
        });
    }

    // Stable sort descending by roll; combatant-kind ordering (Player < Party
    // < Enemy) in the input already reflects the tie-break priority because
    // a stable sort preserves relative order among equal keys.
    initiative.sort_by(|a, b| b.roll.cmp(&a.roll));

    info!(enemy_count = enemies.len(), surprise, "combat started");

    Ok(CombatState {
        enemies,
        initiative,
        current_index: 0,
        round: 1,
        player_defending: false,
        surprise_round: surprise,
        player_surprise_advantage_available: surprise,
        outcome: None,
    })
}

/// Rolls weapon/enemy damage notation. Falls back to 0 rather than
/// panicking if a notation is malformed.
fn roll_damage(notation: &str, crit: bool, dice: &mut Dice) -> i32 {
    let Ok(first) = dice.roll(notation) else {
        return 0;
    };
    let total = if crit {
        match dice.roll(notation) {
            Ok(second) => first.total + (second.total - second.modifier),
            Err(_) => first.total,
        }
    } else {
        first.total
    };
    total.max(0) as i32
}

/// The PC's attack roll bonus: proficiency + STR modifier. Finesse/ranged
/// weapon scaling is a content-authoring concern this engine doesn't model.
pub fn player_attack_bonus(character: &Character) -> i32 {
    character.proficiency_bonus() + modifier(character.abilities.strength)
}

/// Resolves the PC attacking `target_index`. Consumes the post-surprise
/// advantage, if any; otherwise applies the darkness disadvantage when it
/// qualifies. Nat 1 always misses; nat 20 always hits and doubles damage.
pub fn player_attack(
    state: &mut CombatState,
    character: &Character,
    weapon_damage_dice: &str,
    target_index: usize,
    location_dark: bool,
    has_light_source: bool,
    dice: &mut Dice,
) -> Result<AttackResult, CombatError> {
    let target = state
        .enemies
        .get(target_index)
        .ok_or_else(|| CombatError::UnknownCombatant(format!("enemy[{target_index}]")))?;
    if !target.is_alive() {
        return Err(CombatError::TargetDefeated(target.name.clone()));
    }

    let advantage = if state.player_surprise_advantage_available {
        state.player_surprise_advantage_available = false;
        Advantage::Advantage
    } else if check_darkness_penalty(location_dark, has_light_source) {
        Advantage::Disadvantage
    } else {
        Advantage::Normal
    };

    let check = dice.roll_d20(player_attack_bonus(character) as i64, advantage);
    let target_ac = state.enemies[target_index].ac;
    let hit = !check.nat1 && (check.nat20 || check.total >= target_ac as i64);
    let damage = if hit {
        roll_damage(weapon_damage_dice, check.nat20, dice)
    } else {
        0
    };
    let enemy = &mut state.enemies[target_index];
    if hit {
        enemy.take_damage(damage);
    }
    let target_defeated = hit && !enemy.is_alive();

    Ok(AttackResult {
        hit,
        crit: check.nat20,
        damage,
        target_defeated,
    })
}

pub fn player_defend(state: &mut CombatState) {
    state.player_defending = true;
}

/// DEX check vs `10 + highest living enemy DEX mod`. On failure, the
/// nearest living enemy gets a free attack (at the PC's `defend`-adjusted
/// AC, if active) and combat continues.
pub fn player_flee(
    state: &CombatState,
    character: &Character,
    character_ac: i32,
    dice: &mut Dice,
) -> FleeResult {
    let character_ac = character_ac + if state.player_defending { 2 } else { 0 };
    let enemy_dex = state
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.dex_mod)
        .max()
        .unwrap_or(0);
    let dc = 10 + enemy_dex as i64;
    let check = dice.roll_d20(modifier(character.abilities.dexterity) as i64, Advantage::Normal);
    let success = check.total >= dc;

    let opportunity_damage = if success {
        0
    } else if let Some(attacker) = state.enemies.iter().find(|e| e.is_alive()) {
        let atk = dice.roll_d20(attacker.attack_bonus as i64, Advantage::Normal);
        if !atk.nat1 && (atk.nat20 || atk.total >= character_ac as i64) {
            roll_damage(&attacker.damage_dice, atk.nat20, dice)
        } else {
            0
        }
    } else {
        0
    };

    FleeResult {
        success,
        opportunity_damage,
    }
}

/// Deterministic party-member AI: rogue-style `flank` ability spends a
/// charge for advantage on the lowest-HP enemy; a `heal` ability spends a
/// charge healing the PC when below half HP; otherwise attack the
/// lowest-HP living enemy.
pub fn party_member_turn(
    member: &mut PartyMember,
    state: &mut CombatState,
    character_hp_fraction: f32,
    character: &mut Character,
    dice: &mut Dice,
) -> Option<AttackResult> {
    if member.special_ability.as_deref() == Some("heal")
        && member.ability_uses_remaining > 0
        && character_hp_fraction < 0.5
    {
        member.ability_uses_remaining -= 1;
        let healed = dice.roll("2d6").map(|r| r.total as i32).unwrap_or(0);
        character.heal(healed);
        return None;
    }

    let target_index = state
        .living_enemy_indices()
        .into_iter()
        .min_by_key(|&i| state.enemies[i].current_hp)?;

    let flanking = member.special_ability.as_deref() == Some("flank") && member.ability_uses_remaining > 0;
    let advantage = if flanking {
        member.ability_uses_remaining -= 1;
        Advantage::Advantage
    } else {
        Advantage::Normal
    };

    let check = dice.roll_d20(member.attack_bonus as i64, advantage);
    let target_ac = state.enemies[target_index].ac;
    let hit = !check.nat1 && (check.nat20 || check.total >= target_ac as i64);
    let damage = if hit {
        roll_damage(&member.damage_dice, check.nat20, dice)
    } else {
        0
    };
    if hit {
        state.enemies[target_index].take_damage(damage);
    }
    let target_defeated = hit && !state.enemies[target_index].is_alive();

    Some(AttackResult {
        hit,
        crit: check.nat20,
        damage,
        target_defeated,
    })
}

/// Target selection: lowest AC among the PC and living party members; ties
/// broken uniformly at random. A surprised enemy (round 1 of a `SURPRISE`
/// entry) skips its turn entirely and returns `None`. `player_defending`
/// applies the `defend` action's +2 AC to the PC for this attack only.
pub fn enemy_turn(
    enemy: &EnemyInstance,
    character_ac: i32,
    player_defending: bool,
    party: &[PartyMember],
    surprise_round: bool,
    dice: &mut Dice,
) -> Option<EnemyTurnResult> {
    if surprise_round && enemy.surprised {
        return None;
    }

    let player_ac = character_ac + if player_defending { 2 } else { 0 };
    let mut candidates: Vec<(Combatant, i32)> = vec![(Combatant::Player, player_ac)];
    for (i, member) in party.iter().enumerate() {
        if member.is_alive() {
            candidates.push((Combatant::Party(i), member.armor_class));
        }
    }
    let min_ac = candidates.iter().map(|(_, ac)| *ac).min().unwrap();
    let tied: Vec<Combatant> = candidates
        .into_iter()
        .filter(|(_, ac)| *ac == min_ac)
        .map(|(c, _)| c)
        .collect();
    let target = tied[dice.pick_index(tied.len())];

    let check = dice.roll_d20(enemy.attack_bonus as i64, Advantage::Normal);
    let hit = !check.nat1 && (check.nat20 || check.total >= min_ac as i64);
    let damage = if hit {
        roll_damage(&enemy.damage_dice, check.nat20, dice)
    } else {
        0
    };

    Some(EnemyTurnResult {
        target,
        hit,
        crit: check.nat20,
        damage,
    })
}

/// Checks end-of-round victory/defeat conditions and sets `state.outcome`
/// accordingly. Returns the outcome if the fight just ended.
pub fn check_end_conditions(state: &mut CombatState, character: &Character) -> Option<CombatOutcome> {
    if state.outcome.is_some() {
        return state.outcome;
    }
    if state.all_enemies_defeated() {
        state.outcome = Some(CombatOutcome::Victory);
    } else if !character.is_alive() {
        state.outcome = Some(CombatOutcome::Defeat);
    }
    state.outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn scenario() -> Scenario {
        ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone()
    }

    fn character() -> Character {
        let mut dice = Dice::from_seed(1);
        Character::create(&mut dice, &ContentCatalog::bundled(), "Rowan", "fighter", "human").unwrap()
    }

    #[test]
    fn start_combat_rolls_initiative_for_every_combatant() {
        let scenario = scenario();
        let character = character();
        let party = Party::new();
        let mut dice = Dice::from_seed(5);
        let state = start_combat(
            &scenario,
            &["goblin".to_string(), "goblin".to_string()],
            false,
            &character,
            &party,
            &mut dice,
        )
        .unwrap();
        assert_eq!(state.enemies.len(), 2);
        assert_eq!(state.enemies[0].name, "Goblin #1");
        assert_eq!(state.enemies[1].name, "Goblin #2");
        assert_eq!(state.initiative.len(), 3); // PC + 2 goblins
    }

    #[test]
    fn start_combat_rejects_unknown_enemy_type() {
        let scenario = scenario();
        let character = character();
        let party = Party::new();
        let mut dice = Dice::from_seed(5);
        assert!(matches!(
            start_combat(&scenario, &["dragon".to_string()], false, &character, &party, &mut dice),
            Err(CombatError::UnknownEnemyType(_))
        ));
    }

    #[test]
    fn start_combat_rejects_empty_encounter() {
        let scenario = scenario();
        let character = character();
        let party = Party::new();
        let mut dice = Dice::from_seed(5);
        assert!(matches!(
            start_combat(&scenario, &[], false, &character, &party, &mut dice),
            Err(CombatError::EmptyEncounter)
        ));
    }

    #[test]
    fn surprise_marks_enemies_and_grants_pc_advantage_once() {
        let scenario = scenario();
        let character = character();
        let party = Party::new();
        let mut dice = Dice::from_seed(5);
        let state = start_combat(&scenario, &["goblin".to_string()], true, &character, &party, &mut dice).unwrap();
        assert!(state.enemies[0].surprised);
        assert!(state.player_surprise_advantage_available);
    }

    #[test]
    fn attack_outcome_is_internally_consistent_across_many_seeds() {
        let scenario = scenario();
        let character = character();
        for seed in 0..50 {
            let mut dice = Dice::from_seed(seed);
            let mut state =
                start_combat(&scenario, &["goblin".to_string()], false, &character, &Party::new(), &mut dice)
                    .unwrap();
            let result = player_attack(&mut state, &character, "1d6", 0, false, false, &mut dice).unwrap();
            if !result.hit {
                assert_eq!(result.damage, 0);
            }
        }
    }

    #[test]
    fn player_defending_raises_effective_ac_against_enemy_attack() {
        let scenario = scenario();
        let character = character();
        let party = Party::new();
        let mut dice = Dice::from_seed(3);
        let state = start_combat(&scenario, &["goblin".to_string()], false, &character, &party, &mut dice).unwrap();
        let enemy = state.enemies[0].clone();
        let base_ac = 14;

        let mut hits_undefended = 0;
        let mut hits_defending = 0;
        for seed in 0..200 {
            let mut dice = Dice::from_seed(seed);
            if let Some(result) = enemy_turn(&enemy, base_ac, false, &[], false, &mut dice) {
                if result.hit {
                    hits_undefended += 1;
                }
            }
            let mut dice = Dice::from_seed(seed);
            if let Some(result) = enemy_turn(&enemy, base_ac, true, &[], false, &mut dice) {
                if result.hit {
                    hits_defending += 1;
                }
            }
        }
        assert!(
            hits_defending < hits_undefended,
            "defending (+2 AC) should land strictly fewer hits across the same seeds: {hits_defending} vs {hits_undefended}"
        );
    }

    #[test]
    fn check_darkness_penalty_requires_both_dark_and_no_light() {
        assert!(check_darkness_penalty(true, false));
        assert!(!check_darkness_penalty(true, true));
        assert!(!check_darkness_penalty(false, false));
    }

    #[test]
    fn victory_detected_when_all_enemies_defeated() {
        let scenario = scenario();
        let character = character();
        let mut dice = Dice::from_seed(5);
        let mut state = start_combat(&scenario, &["goblin".to_string()], false, &character, &Party::new(), &mut dice).unwrap();
        state.enemies[0].current_hp = 0;
        let outcome = check_end_conditions(&mut state, &character);
        assert_eq!(outcome, Some(CombatOutcome::Victory));
    }

    #[test]
    fn defeat_detected_when_pc_dies() {
        let scenario = scenario();
        let mut character = character();
        character.take_damage(9999);
        let mut dice = Dice::from_seed(5);
        let mut state = start_combat(&scenario, &["goblin".to_string()], false, &character, &Party::new(), &mut dice).unwrap();
        let outcome = check_end_conditions(&mut state, &character);
        assert_eq!(outcome, Some(CombatOutcome::Defeat));
    }
}
