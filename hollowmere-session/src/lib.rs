//! Owns a player's live adventure: the `Session` itself, the concurrent
//! `SessionManager` that holds every session a server process is running,
//! the per-turn `ActionPipeline` that drives prompt → stream → parse →
//! apply → respond, and the environment-driven `EngineConfig`.

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod session;

pub use config::EngineConfig;
pub use context::SessionContext;
pub use error::SessionError;
pub use pipeline::{ActionPipeline, TurnEvent};
pub use session::{Session, SessionManager};
