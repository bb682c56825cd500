use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestError {
    #[error("unknown quest: {0}")]
    UnknownQuest(String),
    #[error("quest {0} already accepted")]
    AlreadyAccepted(String),
    #[error("quest {0} already completed")]
    AlreadyCompleted(String),
    #[error("prerequisites not met for quest {0}")]
    PrerequisitesNotMet(String),
    #[error("quest {0} has not been accepted")]
    NotAccepted(String),
    #[error("not all required objectives are complete for quest {0}")]
    ObjectivesIncomplete(String),
    #[error("quest {0} expired before completion")]
    Expired(String),
}
