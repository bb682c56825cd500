use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NpcError {
    #[error("unknown npc: {0}")]
    UnknownNpc(String),
    #[error("npc {0} refuses to trade")]
    Hostile(String),
    #[error("party is full (max 2 companions)")]
    PartyFull,
    #[error("npc {0} cannot be recruited here")]
    WrongLocation(String),
    #[error("recruitment conditions not met for npc {0}")]
    ConditionsNotMet(String),
    #[error("npc {0} has no party stats defined")]
    NotRecruitable(String),
    #[error("npc {0} is not in the party")]
    NotInParty(String),
    #[error("insufficient gold for recruitment cost")]
    InsufficientGold,
    #[error("missing required item for recruitment cost")]
    MissingItem,
}
