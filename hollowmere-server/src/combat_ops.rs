use serde::Serialize;

use hollowmere_combat::{AttackResult, CombatOutcome, Combatant, EnemyTurnResult};
use hollowmere_content::{ObjectiveKind, OnUseEffect};
use hollowmere_session::Session;

/// One resolved turn in a combat round, in the order it happened, so a
/// client can narrate "the goblin hits you for 4" without re-deriving it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "actor", rename_all = "snake_case")]
pub enum CombatTurnLog {
    Party { name: String, result: AttackResult },
    Enemy { name: String, target: String, hit: bool, crit: bool, damage: i32 },
}

/// Summary of a just-concluded fight: what the player walked away with, so
/// the route handler can fold it into the character/session state it
/// returns without the caller re-deriving anything from `CombatState`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CombatSummary {
    pub outcome: Option<CombatOutcome>,
    pub xp_awarded: u32,
    pub gold_awarded: u32,
    pub items_awarded: Vec<(String, u32)>,
    pub hit_dice_restored: bool,
}

/// True iff the character carries an item whose `on_use_effect` grants
/// light, per §4.H's darkness rule.
pub fn has_light_source(session: &Session) -> bool {
    session.character.inventory.slots().iter().any(|slot| {
        session
            .scenario
            .items
            .get(&slot.item_id)
            .map(|item| matches!(item.on_use_effect, Some(OnUseEffect::GrantLight)))
            .unwrap_or(false)
    })
}

/// Drives every non-player turn (party members, then enemies) until combat
/// ends or the initiative order cycles back to the player, per §4.H's "PC
/// turn / party turn / enemy turn" loop. The player's own action has
/// already been applied by the caller before this runs.
pub fn resolve_until_player_turn(session: &mut Session) -> (Vec<CombatTurnLog>, Option<CombatSummary>) {
    let mut log = Vec::new();

    loop {
        let Some(state) = session.combat.as_mut() else {
            return (log, None);
        };
        if let Some(outcome) = hollowmere_combat::check_end_conditions(state, &session.character) {
            let _ = outcome;
            break;
        }

        let party_alive: Vec<bool> = session.party.members().iter().map(|m| m.is_alive()).collect();
        state.advance_turn(&party_alive);

        match state.current_combatant() {
            Combatant::Player => break,
            Combatant::Party(i) => {
                let character_fraction = session.character.current_hp as f32 / session.character.max_hp.max(1) as f32;
                let Some(state) = session.combat.as_mut() else { break };
                let Some(member) = session.party.members_mut().get_mut(i) else {
                    continue;
                };
                if let Some(result) =
                    hollowmere_combat::party_member_turn(member, state, character_fraction, &mut session.character, &mut session.dice)
                {
                    log.push(CombatTurnLog::Party { name: member.name.clone(), result });
                }
            }
            Combatant::Enemy(i) => {
                let state = session.combat.as_ref().unwrap();
                let Some(enemy) = state.enemies.get(i).cloned() else { continue };
                if !enemy.is_alive() {
                    continue;
                }
                let character_ac = session.character.armor_class(
                    session
                        .character
                        .armor_id
                        .as_ref()
                        .and_then(|id| session.scenario.items.get(id))
                        .and_then(|item| item.ac_bonus)
                        .unwrap_or(0),
                );
                let surprise_round = state.surprise_round;
                let player_defending = state.player_defending;
                let result: Option<EnemyTurnResult> = hollowmere_combat::enemy_turn(
                    &enemy,
                    character_ac,
                    player_defending,
                    session.party.members(),
                    surprise_round,
                    &mut session.dice,
                );
                if let Some(result) = result {
                    apply_enemy_damage(session, result.target, result.damage);
                    let target_name = combatant_name(session, result.target);
                    log.push(CombatTurnLog::Enemy {
                        name: enemy.name.clone(),
                        target: target_name,
                        hit: result.hit,
                        crit: result.crit,
                        damage: result.damage,
                    });
                }
            }
        }

        if let Some(state) = session.combat.as_mut() {
            if hollowmere_combat::check_end_conditions(state, &session.character).is_some() {
                break;
            }
        }
    }

    let summary = finalize_if_over(session);
    (log, summary)
}

fn apply_enemy_damage(session: &mut Session, target: Combatant, damage: i32) {
    match target {
        Combatant::Player => session.character.take_damage(damage),
        Combatant::Party(i) => {
            if let Some(member) = session.party.members_mut().get_mut(i) {
                member.take_damage(damage);
            }
        }
        Combatant::Enemy(_) => {}
    }
}

fn combatant_name(session: &Session, target: Combatant) -> String {
    match target {
        Combatant::Player => session.character.name.clone(),
        Combatant::Party(i) => session
            .party
            .members()
            .get(i)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "companion".to_string()),
        Combatant::Enemy(_) => "enemy".to_string(),
    }
}

/// If combat just concluded, applies victory/defeat effects (§4.H "End
/// conditions") and clears `session.combat`. Returns `None` while the fight
/// is still ongoing.
fn finalize_if_over(session: &mut Session) -> Option<CombatSummary> {
    let outcome = session.combat.as_ref()?.outcome?;
    let mut summary = CombatSummary { outcome: Some(outcome), ..Default::default() };

    if outcome == CombatOutcome::Victory {
        let state = session.combat.take().unwrap();
        let mut boss_fell = false;
        for enemy in &state.enemies {
            let gain = session.character.gain_xp(enemy.xp_reward, "combat victory");
            summary.xp_awarded += enemy.xp_reward;
            if gain.can_level_up {
                tracing::info!(character = %session.character.name, "character can level up");
            }
            if enemy.is_boss {
                boss_fell = true;
            }
            if let Some(enemy_type) = session.scenario.enemies.get(&enemy.enemy_type_id) {
                let loot = hollowmere_combat::roll_loot(enemy_type, &mut session.dice);
                summary.gold_awarded += loot.gold;
                session.character.gold += loot.gold;
                for (item_id, qty) in loot.items {
                    let stackable = session.scenario.items.get(&item_id).map(|i| i.stackable).unwrap_or(false);
                    session.character.add_item(&item_id, qty, stackable);
                    summary.items_awarded.push((item_id, qty));
                }
            }
            session
                .quests
                .check_objective(&session.scenario, ObjectiveKind::Kill, &enemy.enemy_type_id, 1);
        }
        if boss_fell {
            session.character.restore_hit_dice();
            summary.hit_dice_restored = true;
        }
    } else {
        session.combat = None;
    }

    Some(summary)
}
