use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use hollowmere_character::Character;
use hollowmere_choices::ChoiceManager;
use hollowmere_combat::CombatState;
use hollowmere_content::Scenario;
use hollowmere_dice::Dice;
use hollowmere_npc::{NpcRegistry, Party};
use hollowmere_quests::QuestTracker;
use hollowmere_world::LocationEngine;

use crate::context::SessionContext;
use crate::error::SessionError;

/// A single player's complete, in-memory adventure state. Everything here
/// (except `dice`, a live RNG stream) is what a save file serializes and
/// what the action pipeline mutates one turn at a time, always behind the
/// owning `SessionManager` entry's lock.
pub struct Session {
    pub id: Uuid,
    pub scenario: Arc<Scenario>,
    pub character: Character,
    pub location: LocationEngine,
    pub npcs: NpcRegistry,
    pub quests: QuestTracker,
    pub party: Party,
    pub choices: ChoiceManager,
    pub combat: Option<CombatState>,
    pub conversation_history: Vec<(String, String)>,
    pub game_flags: HashSet<String>,
    pub turn: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub dice: Dice,
    pub visited_locations: HashSet<String>,
}

impl Session {
    /// Creates a fresh session whose dice stream is seeded from OS entropy.
    pub fn new(scenario: Arc<Scenario>, character: Character) -> Self {
        Self::new_with_seed(scenario, character, None)
    }

    /// Creates a fresh session, optionally with a deterministic dice seed
    /// (set via `RNG_SEED` for reproducible tests and replays; `None` seeds
    /// from OS entropy in production).
    pub fn new_with_seed(scenario: Arc<Scenario>, character: Character, seed: Option<u64>) -> Self {
        let location = LocationEngine::new(scenario.clone());
        let npcs = NpcRegistry::new(&scenario);
        let quests = QuestTracker::new(&scenario);
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            scenario,
            character,
            location,
            npcs,
            quests,
            party: Party::new(),
            choices: ChoiceManager::new(),
            combat: None,
            conversation_history: Vec::new(),
            game_flags: HashSet::new(),
            turn: 0,
            created_at: now,
            last_activity: now,
            dice: seed.map(Dice::from_seed).unwrap_or_else(Dice::from_entropy),
            visited_locations: HashSet::new(),
        }
    }

    /// Rebuilds a session from parts recovered from a save file. `turn` and
    /// `conversation_history` are carried over verbatim; `created_at` is
    /// reset to the restoration time since the original is not persisted.
    /// Dice state is never saved, so a restored session always gets a fresh
    /// stream (optionally seeded, for deterministic replay tests).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        scenario: Arc<Scenario>,
        character: Character,
        location: LocationEngine,
        npcs: NpcRegistry,
        quests: QuestTracker,
        party: Party,
        choices: ChoiceManager,
        game_flags: HashSet<String>,
        turn: u32,
        conversation_history: Vec<(String, String)>,
        seed: Option<u64>,
    ) -> Self {
        let now = Utc::now();
        let mut session = Session {
            id: Uuid::new_v4(),
            scenario,
            character,
            location,
            npcs,
            quests,
            party,
            choices,
            combat: None,
            conversation_history,
            game_flags,
            turn,
            created_at: now,
            last_activity: now,
            dice: seed.map(Dice::from_seed).unwrap_or_else(Dice::from_entropy),
            visited_locations: HashSet::new(),
        };
        session.refresh_visited_cache();
        session
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn idle_for(&self) -> Duration {
        (Utc::now() - self.last_activity).to_std().unwrap_or_default()
    }

    /// Builds a borrow-only adapter satisfying `ConditionContext` and
    /// `RecruitmentContext` for this turn's condition checks.
    pub fn context(&self) -> SessionContext<'_> {
        SessionContext {
            game_flags: &self.game_flags,
            quests: &self.quests,
            visited_locations: &self.visited_locations,
            character: &self.character,
        }
    }
}

// `visited_locations` is derived from the location engine's own runtime
// table rather than duplicated, so `context()` needs a materialized set to
// hand out a borrow of `&HashSet<String>`. Cached on the session and
// refreshed whenever the location engine moves, to keep `context()` cheap
// and allocation-free on the hot path.
impl Session {
    pub fn refresh_visited_cache(&mut self) {
        self.visited_locations = self.location.visited_location_ids();
    }
}

/// A session's entry in the manager: the session itself behind an
/// exclusive per-session lock, so two requests against the *same* session
/// serialize while requests against *different* sessions never block each
/// other.
type SessionEntry = Arc<Mutex<Session>>;

/// Owns every live session, keyed by its id. Concurrent reads/writes across
/// distinct sessions never contend (`dashmap` shards internally); a single
/// session's turns are strictly ordered by its own mutex.
pub struct SessionManager {
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
    timeout: Duration,
    reaper: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(timeout: Duration) -> Self {
        SessionManager {
            sessions: Arc::new(DashMap::new()),
            timeout,
            reaper: None,
        }
    }

    /// Spawns the background reaper that evicts sessions idle longer than
    /// the configured timeout. Ticks every five minutes; idempotent if
    /// called more than once (the previous handle is replaced and the old
    /// task is aborted).
    pub fn spawn_reaper(&mut self) {
        if let Some(handle) = self.reaper.take() {
            handle.abort();
        }
        let sessions = self.sessions.clone();
        let timeout = self.timeout;
        self.reaper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5 * 60));
            loop {
                interval.tick().await;
                let mut expired = Vec::new();
                for entry in sessions.iter() {
                    let session = entry.value().lock().await;
                    if session.idle_for() > timeout {
                        expired.push(*entry.key());
                    }
                }
                for id in expired {
                    sessions.remove(&id);
                    info!(session = %id, "reaped idle session");
                }
            }
        }));
    }

    pub fn create(&self, session: Session) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "session created");
        id
    }

    pub fn get(&self, id: Uuid) -> Result<SessionEntry, SessionError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::InvalidSession)
    }

    pub fn end(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions.remove(&id).map(|_| ()).ok_or(SessionError::InvalidSession)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.reaper.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn fresh_session() -> Session {
        let catalog = ContentCatalog::bundled();
        let scenario = Arc::new(catalog.scenario("goblin_cave").unwrap().clone());
        let mut dice = Dice::from_seed(1);
        let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
        Session::new(scenario, character)
    }

    #[tokio::test]
    async fn create_get_and_end_round_trip() {
        let manager = SessionManager::new(Duration::from_secs(3600));
        let id = manager.create(fresh_session());
        assert_eq!(manager.len(), 1);
        let entry = manager.get(id).unwrap();
        assert_eq!(entry.lock().await.id, id);
        manager.end(id).unwrap();
        assert!(manager.get(id).is_err());
    }

    #[tokio::test]
    async fn get_unknown_session_is_invalid() {
        let manager = SessionManager::new(Duration::from_secs(3600));
        assert!(matches!(manager.get(Uuid::new_v4()), Err(SessionError::InvalidSession)));
    }
}
