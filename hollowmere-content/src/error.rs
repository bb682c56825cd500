use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML in {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("location {location} exit '{direction}' targets unknown location '{target}'")]
    DanglingExit {
        location: String,
        direction: String,
        target: String,
    },
    #[error("location {location} references unknown npc '{npc_id}'")]
    DanglingNpc { location: String, npc_id: String },
    #[error("location {location} references unknown item '{item_id}'")]
    DanglingItem { location: String, item_id: String },
    #[error("npc {npc} shop inventory references unknown item '{item_id}'")]
    DanglingShopItem { npc: String, item_id: String },
    #[error("quest {quest} giver '{npc_id}' is not a known npc")]
    DanglingQuestGiver { quest: String, npc_id: String },
    #[error("quest {quest} reward references unknown item '{item_id}'")]
    DanglingQuestReward { quest: String, item_id: String },
    #[error("quest {quest} objective '{objective}' targets unknown {kind} '{target}'")]
    DanglingObjective {
        quest: String,
        objective: String,
        kind: String,
        target: String,
    },
    #[error("enemy {enemy} loot table references unknown item '{item_id}'")]
    DanglingLoot { enemy: String, item_id: String },
    #[error("random encounter in {location} references unknown enemy '{enemy_id}'")]
    DanglingEncounterEnemy { location: String, enemy_id: String },
    #[error("duplicate content id '{id}' in {kind}")]
    DuplicateId { kind: String, id: String },
    #[error("scenario '{0}' has no starting location or it does not exist")]
    MissingStartingLocation(String),
    #[error("content catalog has no scenario named '{0}'")]
    UnknownScenario(String),
}
