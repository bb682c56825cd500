pub mod context;
pub mod templates;

pub use context::{CharacterContext, HistoryTurn, LocationContext, PromptContext, QuestContext};
pub use templates::PromptBuilder;
