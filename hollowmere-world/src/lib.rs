//! The location graph: per-session position, exit/conditional-exit
//! evaluation, hidden-location visibility, random encounters, and location
//! events. Content (`hollowmere_content::Location`) is immutable; this crate
//! owns only the state *about* content that changes per session.

pub mod condition;
pub mod engine;
pub mod error;
pub mod state;

pub use condition::{check_discovery, evaluate, ConditionContext, NullContext};
pub use engine::{LocationEngine, LocationSnapshot, MoveOutcome, TriggeredEncounter, TriggeredEvent};
pub use error::WorldError;
pub use state::LocationRuntime;
