//! Per-session quest tracking: acceptance, objective progress, completion,
//! and time-limit expiry. `QuestDef` content (giver, objectives, rewards)
//! stays immutable in `hollowmere-content`; this crate owns only the state
//! that changes as the player plays.

pub mod error;
pub mod tracker;

pub use error::QuestError;
pub use tracker::{QuestStatus, QuestTracker};
