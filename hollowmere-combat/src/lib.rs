//! Turn-based combat resolution: initiative, attacks, party AI, surprise
//! rounds, darkness disadvantage, and loot. Combat state is transient,
//! per-session, and only exists while an encounter is active.

pub mod engine;
pub mod error;
pub mod loot;
pub mod state;

pub use engine::{
    check_darkness_penalty, check_end_conditions, enemy_turn, party_member_turn, player_attack,
    player_attack_bonus, player_defend, player_flee, start_combat, AttackResult, EnemyTurnResult,
    FleeResult,
};
pub use error::CombatError;
pub use loot::{roll_loot, LootResult};
pub use state::{Combatant, CombatOutcome, CombatState, EnemyInstance, InitiativeEntry};
