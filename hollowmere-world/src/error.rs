use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("no exit in that direction")]
    NoSuchExit,
    #[error("that way is blocked for this scene")]
    BlockedByScene,
    #[error("{fail_message}")]
    ConditionFailed { fail_message: String },
    #[error("unknown location id: {0}")]
    UnknownLocation(String),
}
