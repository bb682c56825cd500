use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::choice::{ChoiceDef, EndingDef};
use crate::enemy::EnemyType;
use crate::error::ContentError;
use crate::item::Item;
use crate::location::Location;
use crate::npc::Npc;
use crate::quest::{ObjectiveKind, QuestDef};

/// One content bundle: a complete, self-contained adventure. Everything here
/// is immutable once loaded; per-session progress is tracked elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub starting_location_id: String,
    #[serde(default)]
    pub locations: HashMap<String, Location>,
    #[serde(default)]
    pub npcs: HashMap<String, Npc>,
    #[serde(default)]
    pub items: HashMap<String, Item>,
    #[serde(default)]
    pub quests: HashMap<String, QuestDef>,
    #[serde(default)]
    pub enemies: HashMap<String, EnemyType>,
    #[serde(default)]
    pub choices: HashMap<String, ChoiceDef>,
    #[serde(default)]
    pub endings: Vec<EndingDef>,
}

/// TOML on-disk shape: lists, because repeating `[[locations]]` tables reads
/// better than a map of maps in a hand-authored bundle. Converted to the
/// by-id maps of [`Scenario`] once parsed.
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    id: String,
    name: String,
    starting_location_id: String,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    npcs: Vec<Npc>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    quests: Vec<QuestDef>,
    #[serde(default)]
    enemies: Vec<EnemyType>,
    #[serde(default)]
    choices: Vec<ChoiceDef>,
    #[serde(default)]
    endings: Vec<EndingDef>,
}

impl Scenario {
    /// Parse and validate a scenario bundle from a TOML source string.
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self, ContentError> {
        let file: ScenarioFile = toml::from_str(source).map_err(|source| ContentError::Toml {
            path: origin.to_string(),
            source,
        })?;
        let scenario = Scenario {
            id: file.id,
            name: file.name,
            starting_location_id: file.starting_location_id,
            locations: index_by(file.locations, |l| l.id.clone(), "locations")?,
            npcs: index_by(file.npcs, |n| n.id.clone(), "npcs")?,
            items: index_by(file.items, |i| i.id.clone(), "items")?,
            quests: index_by(file.quests, |q| q.id.clone(), "quests")?,
            enemies: index_by(file.enemies, |e| e.id.clone(), "enemies")?,
            choices: index_by(file.choices, |c| c.id.clone(), "choices")?,
            endings: file.endings,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario bundle from a TOML file on disk.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Referential-integrity check: every exit target, npc/item reference,
    /// quest giver, quest objective target, and loot-table item must resolve
    /// inside this same bundle. Never panics on malformed content; returns a
    /// typed error instead.
    fn validate(&self) -> Result<(), ContentError> {
        if !self.locations.contains_key(&self.starting_location_id) {
            return Err(ContentError::MissingStartingLocation(self.id.clone()));
        }
        for location in self.locations.values() {
            for (direction, target) in &location.exits {
                if !self.locations.contains_key(target) {
                    return Err(ContentError::DanglingExit {
                        location: location.id.clone(),
                        direction: direction.clone(),
                        target: target.clone(),
                    });
                }
            }
            for npc_id in &location.npcs {
                if !self.npcs.contains_key(npc_id) {
                    return Err(ContentError::DanglingNpc {
                        location: location.id.clone(),
                        npc_id: npc_id.clone(),
                    });
                }
            }
            for item_id in &location.items {
                if !self.items.contains_key(item_id) {
                    return Err(ContentError::DanglingItem {
                        location: location.id.clone(),
                        item_id: item_id.clone(),
                    });
                }
            }
            for encounter in &location.random_encounters {
                for enemy_id in &encounter.enemies {
                    if !self.enemies.contains_key(enemy_id) {
                        return Err(ContentError::DanglingEncounterEnemy {
                            location: location.id.clone(),
                            enemy_id: enemy_id.clone(),
                        });
                    }
                }
            }
        }

        for npc in self.npcs.values() {
            for item_id in npc.shop_inventory.keys() {
                if !self.items.contains_key(item_id) {
                    return Err(ContentError::DanglingShopItem {
                        npc: npc.id.clone(),
                        item_id: item_id.clone(),
                    });
                }
            }
        }

        for quest in self.quests.values() {
            if !self.npcs.contains_key(&quest.giver_npc_id) {
                return Err(ContentError::DanglingQuestGiver {
                    quest: quest.id.clone(),
                    npc_id: quest.giver_npc_id.clone(),
                });
            }
            for item_id in &quest.rewards.items {
                if !self.items.contains_key(item_id) {
                    return Err(ContentError::DanglingQuestReward {
                        quest: quest.id.clone(),
                        item_id: item_id.clone(),
                    });
                }
            }
            for objective in &quest.objectives {
                let resolves = match objective.kind {
                    ObjectiveKind::Kill => self.enemies.contains_key(&objective.target),
                    ObjectiveKind::FindItem | ObjectiveKind::Collect => {
                        self.items.contains_key(&objective.target)
                    }
                    ObjectiveKind::TalkTo => self.npcs.contains_key(&objective.target),
                    ObjectiveKind::ReachLocation => self.locations.contains_key(&objective.target),
                };
                if !resolves {
                    return Err(ContentError::DanglingObjective {
                        quest: quest.id.clone(),
                        objective: objective.id.clone(),
                        kind: format!("{:?}", objective.kind),
                        target: objective.target.clone(),
                    });
                }
            }
        }

        for enemy in self.enemies.values() {
            for loot in &enemy.loot_table {
                if !self.items.contains_key(&loot.item_id) {
                    return Err(ContentError::DanglingLoot {
                        enemy: enemy.id.clone(),
                        item_id: loot.item_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn index_by<T>(
    items: Vec<T>,
    key: impl Fn(&T) -> String,
    kind: &str,
) -> Result<HashMap<String, T>, ContentError> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let id = key(&item);
        if map.insert(id.clone(), item).is_some() {
            return Err(ContentError::DuplicateId {
                kind: kind.to_string(),
                id,
            });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        id = "test_scenario"
        name = "Test Scenario"
        starting_location_id = "start"

        [[locations]]
        id = "start"
        name = "Start"
        description = "The beginning."
        exits = { north = "end" }

        [[locations]]
        id = "end"
        name = "End"
        description = "The end."
    "#;

    #[test]
    fn loads_a_minimal_valid_scenario() {
        let scenario = Scenario::from_toml_str(MINIMAL, "inline").unwrap();
        assert_eq!(scenario.locations.len(), 2);
        assert_eq!(scenario.starting_location_id, "start");
    }

    #[test]
    fn rejects_dangling_exit() {
        let broken = MINIMAL.replace("north = \"end\"", "north = \"nowhere\"");
        let err = Scenario::from_toml_str(&broken, "inline").unwrap_err();
        assert!(matches!(err, ContentError::DanglingExit { .. }));
    }

    #[test]
    fn rejects_missing_starting_location() {
        let broken = MINIMAL.replace("starting_location_id = \"start\"", "starting_location_id = \"nope\"");
        let err = Scenario::from_toml_str(&broken, "inline").unwrap_err();
        assert!(matches!(err, ContentError::MissingStartingLocation(_)));
    }

    #[test]
    fn rejects_duplicate_location_ids() {
        let duped = format!(
            "{MINIMAL}\n[[locations]]\nid = \"start\"\nname = \"Dupe\"\ndescription = \"dupe\"\n"
        );
        let err = Scenario::from_toml_str(&duped, "inline").unwrap_err();
        assert!(matches!(err, ContentError::DuplicateId { .. }));
    }
}
