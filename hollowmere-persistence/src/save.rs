use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use hollowmere_character::Character;
use hollowmere_choices::ChoiceManager;
use hollowmere_content::ContentCatalog;
use hollowmere_npc::{NpcRegistry, Party};
use hollowmere_quests::QuestTracker;
use hollowmere_session::Session;
use hollowmere_world::{LocationEngine, LocationSnapshot};

use crate::error::PersistenceError;

/// The on-disk schema version this build writes and accepts. Bumped when
/// the shape of `SaveFile` changes in a way old saves can't satisfy.
pub const SAVE_VERSION: u32 = 1;

/// Most recent turns of narration kept in a save, matching the session's
/// own in-memory bound.
const MAX_SAVED_HISTORY_TURNS: usize = 40;

/// A single JSON document capturing everything needed to resume a session,
/// per §4.O. Deliberately excludes transient combat state: a save taken
/// mid-fight resumes the player just outside it rather than trying to
/// round-trip initiative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub scenario_id: String,
    pub character: Character,
    pub location: LocationSnapshot,
    pub npcs: NpcRegistry,
    pub quests: QuestTracker,
    pub party: Party,
    pub choices: ChoiceManager,
    pub game_flags: HashSet<String>,
    pub turn: u32,
    #[serde(default)]
    pub chat_history: Vec<(String, String)>,
}

impl SaveFile {
    pub fn from_session(session: &Session, description: impl Into<String>) -> Self {
        let history_start = session
            .conversation_history
            .len()
            .saturating_sub(MAX_SAVED_HISTORY_TURNS * 2);
        SaveFile {
            version: SAVE_VERSION,
            timestamp: Utc::now(),
            description: description.into(),
            scenario_id: session.scenario.id.clone(),
            character: session.character.clone(),
            location: session.location.snapshot(),
            npcs: session.npcs.clone(),
            quests: session.quests.clone(),
            party: session.party.clone(),
            choices: session.choices.clone(),
            game_flags: session.game_flags.clone(),
            turn: session.turn,
            chat_history: session.conversation_history[history_start..].to_vec(),
        }
    }

    /// Rebuilds a playable session from this save, re-binding it to the
    /// scenario content currently loaded by `catalog`.
    pub fn into_session(self, catalog: &ContentCatalog) -> Result<Session, PersistenceError> {
        if self.version != SAVE_VERSION {
            return Err(PersistenceError::VersionMismatch {
                found: self.version,
                expected: SAVE_VERSION,
            });
        }
        let scenario = catalog
            .scenario(&self.scenario_id)
            .map_err(|_| PersistenceError::Corrupted(format!("unknown scenario '{}'", self.scenario_id)))?;
        let scenario = Arc::new(scenario.clone());

        if !scenario.locations.contains_key(&self.location.current_id) {
            return Err(PersistenceError::Corrupted(format!(
                "save references unknown location '{}'",
                self.location.current_id
            )));
        }

        let location = LocationEngine::from_snapshot(scenario.clone(), self.location);

        Ok(Session::from_parts(
            scenario,
            self.character,
            location,
            self.npcs,
            self.quests,
            self.party,
            self.choices,
            self.game_flags,
            self.turn,
            self.chat_history,
            None,
        ))
    }
}

/// Sanitizes a user-supplied save name per §4.O: strips path-traversal and
/// separator characters, keeps `[A-Za-z0-9_\- ]`, truncates to 50 bytes,
/// and falls back to `quicksave` if the result would be empty.
pub fn sanitize_save_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == ' ')
        .collect();
    let trimmed = cleaned.trim();
    let truncated: String = trimmed.chars().take(50).collect();
    if truncated.is_empty() {
        "quicksave".to_string()
    } else {
        truncated
    }
}

fn save_path(save_dir: &Path, name: &str) -> PathBuf {
    save_dir.join(format!("{name}.json"))
}

/// Writes `save` atomically: serialize to a temp file in `save_dir`, fsync
/// it, then rename over the final path. A reader can never observe a
/// partially-written save, even across a crash between the write and the
/// rename.
pub fn write_save(save_dir: &Path, name: &str, save: &SaveFile) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(save_dir)?;
    let sanitized = sanitize_save_name(name);
    let final_path = save_path(save_dir, &sanitized);
    let tmp_path = save_dir.join(format!(".{sanitized}.tmp"));

    let json = serde_json::to_vec_pretty(save)
        .map_err(|e| PersistenceError::Corrupted(format!("failed to serialize save: {e}")))?;

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(&json)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, &final_path)?;
    info!(name = sanitized, path = %final_path.display(), "save written");
    Ok(final_path)
}

/// Loads and validates a save by name. Never panics on malformed input:
/// anything from a missing file to a truncated document becomes a typed
/// error.
pub fn read_save(save_dir: &Path, name: &str) -> Result<SaveFile, PersistenceError> {
    let sanitized = sanitize_save_name(name);
    let path = save_path(save_dir, &sanitized);
    let text = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PersistenceError::NotFound(sanitized.clone())
        } else {
            PersistenceError::Io(e)
        }
    })?;
    let save: SaveFile = serde_json::from_str(&text)
        .map_err(|e| PersistenceError::Corrupted(format!("malformed save '{sanitized}': {e}")))?;
    Ok(save)
}

/// Lists the save names available in `save_dir`, sorted alphabetically.
/// An absent directory is treated as "no saves yet", not an error.
pub fn list_saves(save_dir: &Path) -> Result<Vec<String>, PersistenceError> {
    if !save_dir.exists() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = fs::read_dir(save_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
            } else {
                None
            }
        })
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_dice::Dice;
    use tempfile::tempdir;

    fn sample_session() -> Session {
        let catalog = ContentCatalog::bundled();
        let scenario = Arc::new(catalog.scenario("goblin_cave").unwrap().clone());
        let mut dice = Dice::from_seed(1);
        let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
        Session::new(scenario, character)
    }

    #[test]
    fn sanitize_strips_path_traversal() {
        assert_eq!(sanitize_save_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_save_name("my save!!"), "my save");
        assert_eq!(sanitize_save_name(""), "quicksave");
        assert_eq!(sanitize_save_name("   "), "quicksave");
    }

    #[test]
    fn sanitize_truncates_to_fifty_chars() {
        let long_name = "a".repeat(100);
        assert_eq!(sanitize_save_name(&long_name).len(), 50);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let session = sample_session();
        let save = SaveFile::from_session(&session, "before the cave");
        write_save(dir.path(), "slot1", &save).unwrap();

        let loaded = read_save(dir.path(), "slot1").unwrap();
        assert_eq!(loaded.character.name, session.character.name);
        assert_eq!(loaded.scenario_id, session.scenario.id);
    }

    #[test]
    fn read_missing_save_is_not_found() {
        let dir = tempdir().unwrap();
        let result = read_save(dir.path(), "nope");
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let catalog = ContentCatalog::bundled();
        let session = sample_session();
        let mut save = SaveFile::from_session(&session, "test");
        save.version = 999;
        let result = save.into_session(&catalog);
        assert!(matches!(result, Err(PersistenceError::VersionMismatch { .. })));
    }

    #[test]
    fn list_saves_is_empty_for_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does_not_exist");
        assert!(list_saves(&missing).unwrap().is_empty());
    }

    #[test]
    fn list_saves_sorted_alphabetically() {
        let dir = tempdir().unwrap();
        let session = sample_session();
        let save = SaveFile::from_session(&session, "x");
        write_save(dir.path(), "zzz", &save).unwrap();
        write_save(dir.path(), "aaa", &save).unwrap();
        assert_eq!(list_saves(dir.path()).unwrap(), vec!["aaa", "zzz"]);
    }
}
