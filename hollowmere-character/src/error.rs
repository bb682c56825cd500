use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CharacterError {
    #[error("invalid name: must be 1-50 printable characters after trimming")]
    InvalidName,
    #[error("insufficient xp to level up: need {needed}, have {have}")]
    InsufficientXp { needed: u32, have: u32 },
    #[error("cannot rest while in combat")]
    CannotRestInCombat,
    #[error("already at full hp")]
    FullHp,
    #[error("no hit dice remaining")]
    NoHitDice,
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("cannot equip item {0}: wrong item type")]
    CannotEquip(String),
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("unknown race: {0}")]
    UnknownRace(String),
    #[error("already at max level")]
    MaxLevel,
}
