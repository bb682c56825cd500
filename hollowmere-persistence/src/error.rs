use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save directory could not be created or written: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file is corrupted: {0}")]
    Corrupted(String),
    #[error("save file version {found} is incompatible with the current version {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("no save named '{0}' exists")]
    NotFound(String),
    #[error("save belongs to scenario '{saved}', but scenario '{current}' is loaded")]
    ScenarioMismatch { saved: String, current: String },
}
