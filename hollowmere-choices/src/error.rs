use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("unknown choice: {0}")]
    UnknownChoice(String),
    #[error("choice {0} is not currently available")]
    NotAvailable(String),
    #[error("choice {0} has already been resolved")]
    AlreadyResolved(String),
    #[error("unknown option '{option}' for choice {choice}")]
    UnknownOption { choice: String, option: String },
    #[error("requirement not met for option '{option}' of choice {choice}")]
    RequirementNotMet { choice: String, option: String },
}
