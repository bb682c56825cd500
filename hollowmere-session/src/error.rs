use thiserror::Error;

/// Errors the session layer produces directly. Errors from the subsystems a
/// session owns (combat, shop, quests, ...) are wrapped rather than
/// flattened, so the HTTP layer can still match on the original kind.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown or expired session")]
    InvalidSession,
    #[error("input must be a non-empty string of at most {max} bytes")]
    InvalidInput { max: usize },
    #[error("cannot travel while in combat")]
    TravelInCombat,
    #[error("not currently in combat")]
    NotInCombat,
    #[error("combat is already in progress")]
    AlreadyInCombat,
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
    #[error("unknown location: {0}")]
    UnknownLocation(String),
    #[error("unknown npc: {0}")]
    UnknownNpc(String),
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("character error: {0}")]
    Character(#[from] hollowmere_character::CharacterError),
    #[error("world error: {0}")]
    World(#[from] hollowmere_world::WorldError),
    #[error("npc error: {0}")]
    Npc(#[from] hollowmere_npc::NpcError),
    #[error("shop error: {0}")]
    Shop(#[from] hollowmere_shop::ShopError),
    #[error("quest error: {0}")]
    Quest(#[from] hollowmere_quests::QuestError),
    #[error("combat error: {0}")]
    Combat(#[from] hollowmere_combat::CombatError),
    #[error("choice error: {0}")]
    Choice(#[from] hollowmere_choices::ChoiceError),
    #[error("content error: {0}")]
    Content(#[from] hollowmere_content::ContentError),
    #[error("llm error: {0}")]
    Llm(#[from] hollowmere_llm::LlmError),
    #[error("the action pipeline timed out")]
    TurnTimeout,
}
