use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::class::{ClassDef, RaceDef};
use crate::error::ContentError;
use crate::scenario::Scenario;

#[derive(Debug, Deserialize)]
struct ClassesFile {
    #[serde(default)]
    classes: Vec<ClassDef>,
}

#[derive(Debug, Deserialize)]
struct RacesFile {
    #[serde(default)]
    races: Vec<RaceDef>,
}

/// The full set of content the server has loaded at startup: class/race
/// tables shared across every scenario, plus every scenario bundle. Read-only
/// for the lifetime of the process; shared via `Arc` by every session.
#[derive(Debug, Default)]
pub struct ContentCatalog {
    pub classes: HashMap<String, ClassDef>,
    pub races: HashMap<String, RaceDef>,
    pub scenarios: HashMap<String, Scenario>,
}

impl ContentCatalog {
    /// Load `classes.toml`, `races.toml`, and every `*.toml` file under
    /// `scenarios/` inside `content_dir`.
    pub fn load_from_dir<P: AsRef<Path>>(content_dir: P) -> Result<Self, ContentError> {
        let content_dir = content_dir.as_ref();
        let classes = load_classes(&content_dir.join("classes.toml"))?;
        let races = load_races(&content_dir.join("races.toml"))?;

        let mut scenarios = HashMap::new();
        let scenarios_dir = content_dir.join("scenarios");
        if scenarios_dir.is_dir() {
            let mut entries: Vec<_> = fs::read_dir(&scenarios_dir)
                .map_err(|source| ContentError::Io {
                    path: scenarios_dir.display().to_string(),
                    source,
                })?
                .filter_map(|e| e.ok())
                .collect();
            entries.sort_by_key(|e| e.path());
            for entry in entries {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("toml") {
                    let scenario = Scenario::load_from_file(&path)?;
                    scenarios.insert(scenario.id.clone(), scenario);
                }
            }
        }

        Ok(ContentCatalog {
            classes,
            races,
            scenarios,
        })
    }

    /// Build a catalog with only the bundled demo scenario and classes,
    /// used by tests and by the server when no `--content-dir` is provided.
    pub fn bundled() -> Self {
        let classes = load_classes_str(include_str!("../scenarios/classes.toml"), "bundled:classes.toml")
            .expect("bundled classes.toml must be valid");
        let races = load_races_str(include_str!("../scenarios/races.toml"), "bundled:races.toml")
            .expect("bundled races.toml must be valid");
        let scenario = Scenario::from_toml_str(
            include_str!("../scenarios/goblin_cave.toml"),
            "bundled:goblin_cave.toml",
        )
        .expect("bundled demo scenario must be valid");
        let mut scenarios = HashMap::new();
        scenarios.insert(scenario.id.clone(), scenario);
        ContentCatalog {
            classes,
            races,
            scenarios,
        }
    }

    pub fn scenario(&self, id: &str) -> Result<&Scenario, ContentError> {
        self.scenarios
            .get(id)
            .ok_or_else(|| ContentError::UnknownScenario(id.to_string()))
    }

    pub fn default_scenario(&self) -> Option<&Scenario> {
        self.scenarios.values().next()
    }
}

fn load_classes(path: &Path) -> Result<HashMap<String, ClassDef>, ContentError> {
    let text = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_classes_str(&text, &path.display().to_string())
}

fn load_classes_str(text: &str, origin: &str) -> Result<HashMap<String, ClassDef>, ContentError> {
    let file: ClassesFile = toml::from_str(text).map_err(|source| ContentError::Toml {
        path: origin.to_string(),
        source,
    })?;
    Ok(file.classes.into_iter().map(|c| (c.id.clone(), c)).collect())
}

fn load_races(path: &Path) -> Result<HashMap<String, RaceDef>, ContentError> {
    let text = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_races_str(&text, &path.display().to_string())
}

fn load_races_str(text: &str, origin: &str) -> Result<HashMap<String, RaceDef>, ContentError> {
    let file: RacesFile = toml::from_str(text).map_err(|source| ContentError::Toml {
        path: origin.to_string(),
        source,
    })?;
    Ok(file.races.into_iter().map(|r| (r.id.clone(), r)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_has_demo_scenario_and_tables() {
        let catalog = ContentCatalog::bundled();
        assert!(catalog.scenario("goblin_cave").is_ok());
        assert!(catalog.classes.contains_key("fighter"));
        assert!(catalog.races.contains_key("dwarf"));
    }
}
