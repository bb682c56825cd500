//! Atomic JSON save/load for a session: a single `SaveFile` document, a
//! sanitized on-disk name, and a temp-file-then-rename write path so a
//! reader never observes a half-written save.

pub mod error;
pub mod save;

pub use error::PersistenceError;
pub use save::{list_saves, read_save, sanitize_save_name, write_save, SaveFile, SAVE_VERSION};
