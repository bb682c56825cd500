//! Per-session moral-choice tracking: which scenario-gated choices have
//! fired, what option the player picked, and the running alignment score
//! the ending predictor reads. `ChoiceDef`/`EndingDef` content stays
//! immutable in `hollowmere-content`; this crate owns only the state that
//! changes as the player plays.

pub mod engine;
pub mod error;

pub use engine::{ChoiceManager, ChoiceOutcome};
pub use error::ChoiceError;
