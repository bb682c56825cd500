use serde::{Deserialize, Serialize};

/// One enemy on the field. Cloned from `EnemyType` content at encounter
/// start; `name` gets an ordinal suffix when the encounter has duplicates
/// ("Goblin #1", "Goblin #2").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyInstance {
    pub enemy_type_id: String,
    pub name: String,
    pub current_hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    pub attack_bonus: i32,
    pub damage_dice: String,
    pub dex_mod: i32,
    pub is_boss: bool,
    pub xp_reward: u32,
    pub surprised: bool,
}

impl EnemyInstance {
    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.current_hp = (self.current_hp - amount.max(0)).max(0);
    }
}

/// A slot in the initiative order. Index-based so the same enemy or party
/// member can be looked up again after their HP changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combatant {
    Player,
    Party(usize),
    Enemy(usize),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitiativeEntry {
    pub combatant: Combatant,
    pub roll: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

/// Full state of one active combat encounter, owned by the session for the
/// encounter's duration. Only `hollowmere-combat`'s turn functions mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub enemies: Vec<EnemyInstance>,
    pub initiative: Vec<InitiativeEntry>,
    pub current_index: usize,
    pub round: u32,
    pub player_defending: bool,
    pub surprise_round: bool,
    /// Consumed by the PC's first attack after a `SURPRISE` combat entry.
    pub player_surprise_advantage_available: bool,
    pub outcome: Option<CombatOutcome>,
}

impl CombatState {
    pub fn current_combatant(&self) -> Combatant {
        self.initiative[self.current_index].combatant
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn living_enemy_indices(&self) -> Vec<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_alive())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn all_enemies_defeated(&self) -> bool {
        self.enemies.iter().all(|e| !e.is_alive())
    }

    /// Advances to the next living combatant's turn, wrapping to a new
    /// round (and decaying round-scoped flags) when the order cycles.
    pub fn advance_turn(&mut self, party_alive: &[bool]) {
        loop {
            self.current_index += 1;
            if self.current_index >= self.initiative.len() {
                self.current_index = 0;
                self.round += 1;
                self.player_defending = false;
                self.surprise_round = false;
            }
            match self.initiative[self.current_index].combatant {
                Combatant::Player => break,
                Combatant::Party(i) => {
                    if party_alive.get(i).copied().unwrap_or(false) {
                        break;
                    }
                }
                Combatant::Enemy(i) => {
                    if self.enemies.get(i).is_some_and(|e| e.is_alive()) {
                        break;
                    }
                }
            }
        }
    }
}
