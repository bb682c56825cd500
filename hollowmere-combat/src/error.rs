use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("unknown enemy type: {0}")]
    UnknownEnemyType(String),
    #[error("no enemies to fight")]
    EmptyEncounter,
    #[error("combat is already in progress")]
    AlreadyInCombat,
    #[error("no combat in progress")]
    NotInCombat,
    #[error("it is not {0}'s turn")]
    NotYourTurn(String),
    #[error("unknown combatant: {0}")]
    UnknownCombatant(String),
    #[error("target is already defeated: {0}")]
    TargetDefeated(String),
    #[error("party member {0} has no ability charges remaining")]
    NoAbilityUses(String),
}
