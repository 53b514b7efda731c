//! Catalog loading and lookup

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use tracing::info;

use super::{CharacterDefinition, DataError, EnemyDefinition};

const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.toml");
const BUNDLED_ORIGIN: &str = "<bundled catalog>";

/// Root structure of a catalog TOML file
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "character")]
    characters: Vec<CharacterDefinition>,
    #[serde(default, rename = "enemy")]
    enemies: Vec<EnemyDefinition>,
}

/// Immutable lookup table of playable characters and enemies.
///
/// Definitions are shared with combatants through `Arc`, so a battle keeps
/// a cheap reference to the template it was built from.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    characters: Vec<Arc<CharacterDefinition>>,
    enemies: Vec<Arc<EnemyDefinition>>,
    character_index: HashMap<String, usize>,
    enemy_index: HashMap<String, usize>,
}

impl Catalog {
    /// The catalog shipped inside this crate.
    pub fn bundled() -> Result<Self, DataError> {
        Self::from_toml_str(BUNDLED_CATALOG, Path::new(BUNDLED_ORIGIN))
    }

    /// Load from a TOML file on disk.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content, path)?;
        info!(
            path = %path.display(),
            characters = catalog.characters.len(),
            enemies = catalog.enemies.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Load from `path` if given, otherwise the bundled catalog.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self, DataError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    /// Parse and validate catalog TOML. `origin` is only used in errors.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, DataError> {
        let file: CatalogFile = toml::from_str(content).map_err(|source| DataError::ParseToml {
            path: origin.to_path_buf(),
            source,
        })?;

        validate(&file.characters, origin, "character")?;
        validate(&file.enemies, origin, "enemy")?;

        let characters: Vec<_> = file.characters.into_iter().map(Arc::new).collect();
        let enemies: Vec<_> = file.enemies.into_iter().map(Arc::new).collect();
        let character_index = index_of(&characters);
        let enemy_index = index_of(&enemies);

        Ok(Self {
            characters,
            enemies,
            character_index,
            enemy_index,
        })
    }

    pub fn character(&self, id: &str) -> Option<&Arc<CharacterDefinition>> {
        self.character_index
            .get(id)
            .and_then(|&i| self.characters.get(i))
    }

    pub fn enemy(&self, id: &str) -> Option<&Arc<EnemyDefinition>> {
        self.enemy_index.get(id).and_then(|&i| self.enemies.get(i))
    }

    /// Characters in file order
    pub fn characters(&self) -> impl Iterator<Item = &Arc<CharacterDefinition>> {
        self.characters.iter()
    }

    /// Enemies in file order
    pub fn enemies(&self) -> impl Iterator<Item = &Arc<EnemyDefinition>> {
        self.enemies.iter()
    }
}

fn index_of(defs: &[Arc<CharacterDefinition>]) -> HashMap<String, usize> {
    defs.iter()
        .enumerate()
        .map(|(i, def)| (def.id.clone(), i))
        .collect()
}

fn validate(defs: &[CharacterDefinition], origin: &Path, what: &str) -> Result<(), DataError> {
    let invalid = |reason: String| DataError::InvalidDefinition {
        path: PathBuf::from(origin),
        reason,
    };

    let mut seen = HashSet::new();
    for def in defs {
        if def.id.is_empty() {
            return Err(invalid(format!("{what} with empty id")));
        }
        if !seen.insert(def.id.as_str()) {
            return Err(invalid(format!("duplicate {what} id '{}'", def.id)));
        }
        if def.abilities.is_empty() {
            return Err(invalid(format!("{what} '{}' has no abilities", def.id)));
        }
        if let Some(ability) = def.abilities.iter().find(|a| a.id.is_empty()) {
            return Err(invalid(format!(
                "{what} '{}' has an ability with empty id ('{}')",
                def.id, ability.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AbilityKind;

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::bundled().expect("bundled catalog parses");
        assert_eq!(catalog.characters().count(), 6);
        assert!(catalog.enemies().count() >= 3);

        let insular = catalog.character("insular").expect("insular exists");
        let coral = insular.ability("coral").expect("coral exists");
        assert_eq!(coral.kind, AbilityKind::HealSingle);
        assert_eq!(catalog.enemy("llorona").map(|e| e.base.resource), Some(0));
    }

    #[test]
    fn heal_single_accepts_snake_case_alias() {
        let toml = r#"
            [[character]]
            id = "a"
            name = "A"
            base = { health = 10, attack = 1, defense = 1, speed = 1, resource = 5 }
            [[character.abilities]]
            id = "mend"
            name = "Mend"
            kind = "heal_single"
        "#;
        let catalog = Catalog::from_toml_str(toml, Path::new("test")).expect("parses");
        let ability = catalog.character("a").and_then(|c| c.ability("mend"));
        assert_eq!(ability.map(|a| a.kind), Some(AbilityKind::HealSingle));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let toml = r#"
            [[enemy]]
            id = "x"
            name = "X"
            base = { health = 10, attack = 1, defense = 1, speed = 1 }
            abilities = [{ id = "hit", name = "Hit", kind = "physical", power = 3 }]

            [[enemy]]
            id = "x"
            name = "X again"
            base = { health = 10, attack = 1, defense = 1, speed = 1 }
            abilities = [{ id = "hit", name = "Hit", kind = "physical", power = 3 }]
        "#;
        let err = Catalog::from_toml_str(toml, Path::new("dupes.toml")).unwrap_err();
        assert!(matches!(err, DataError::InvalidDefinition { .. }));
    }

    #[test]
    fn character_without_abilities_is_rejected() {
        let toml = r#"
            [[character]]
            id = "empty"
            name = "Empty"
            base = { health = 10, attack = 1, defense = 1, speed = 1, resource = 0 }
        "#;
        let err = Catalog::from_toml_str(toml, Path::new("empty.toml")).unwrap_err();
        assert!(err.to_string().contains("no abilities"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Catalog::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, DataError::ReadFile { .. }));
    }
}
