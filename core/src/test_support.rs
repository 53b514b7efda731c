//! Shared fixtures for unit tests

use std::path::Path;
use std::sync::Arc;

use crate::catalog::{AbilityDefinition, AbilityKind, BaseStats, Catalog, CharacterDefinition};
use crate::combatant::{ClientId, Combatant, Stats};
use crate::narrative::Story;

pub fn ability(id: &str, kind: AbilityKind, power: Option<i32>) -> AbilityDefinition {
    AbilityDefinition {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        power,
        cost: 0,
        cooldown: 0,
        duration: None,
        effect: None,
        poison: None,
        bleed: None,
        root: None,
        fear: None,
        knockback: None,
    }
}

/// `[health, attack, defense, speed, resource]`
pub fn character(id: &str, base: [i32; 5], abilities: Vec<AbilityDefinition>) -> Arc<CharacterDefinition> {
    let [health, attack, defense, speed, resource] = base;
    Arc::new(CharacterDefinition {
        id: id.to_string(),
        name: id.to_string(),
        region: String::new(),
        base: BaseStats {
            health,
            attack,
            defense,
            speed,
            resource,
        },
        abilities,
    })
}

pub fn hero(client: &str, definition: &Arc<CharacterDefinition>) -> Combatant {
    Combatant::hero(
        ClientId::from(client),
        definition.clone(),
        Stats::from(&definition.base),
    )
}

pub fn client(id: &str) -> ClientId {
    ClientId::from(id)
}

/// Small catalog with predictable numbers for room-level tests.
pub fn small_catalog() -> Arc<Catalog> {
    let toml = r#"
        [[character]]
        id = "striker"
        name = "Striker"
        base = { health = 100, attack = 35, defense = 20, speed = 30, resource = 50 }
        abilities = [
            { id = "strike", name = "Strike", kind = "physical", power = 30 },
            { id = "focus", name = "Focus", kind = "buff", effect = { attack = 10 }, duration = 2, cooldown = 2, cost = 10 },
        ]

        [[character]]
        id = "mender"
        name = "Mender"
        base = { health = 90, attack = 20, defense = 20, speed = 20, resource = 60 }
        abilities = [
            { id = "jab", name = "Jab", kind = "physical", power = 10 },
            { id = "mend", name = "Mend", kind = "heal", power = 30, cost = 15 },
        ]

        [[character]]
        id = "spare"
        name = "Spare"
        base = { health = 80, attack = 20, defense = 10, speed = 10, resource = 10 }
        abilities = [{ id = "poke", name = "Poke", kind = "physical", power = 5 }]

        [[enemy]]
        id = "brute"
        name = "Brute"
        base = { health = 100, attack = 30, defense = 20, speed = 25 }
        abilities = [{ id = "smash", name = "Smash", kind = "physical", power = 20 }]

        [[enemy]]
        id = "king"
        name = "King"
        base = { health = 40, attack = 30, defense = 0, speed = 5 }
        abilities = [{ id = "slam", name = "Slam", kind = "physical", power = 5 }]
    "#;
    match Catalog::from_toml_str(toml, Path::new("fixture")) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => panic!("fixture catalog: {e}"),
    }
}

/// Two chapters: an intro with two options, a boss node that closes
/// chapter one, and a second chapter start.
pub fn small_story() -> Arc<Story> {
    let toml = r#"
        [[chapter]]
        id = "one"
        title = "One"
        narrative = "First"
        start = "intro"
        final_boss = "king"

        [chapter.nodes.intro]
        options = [
            { id = "left", label = "Left", next = "fight" },
            { id = "right", label = "Right", next = "throne" },
        ]
        reward = { heal = 10, buff = { speed = 5, duration = 2 } }

        [chapter.nodes.fight]
        boss = "brute"
        next = "throne"

        [chapter.nodes.throne]
        boss = "king"
        next_chapter = "two"
        reward = { resource = 5 }

        [[chapter]]
        id = "two"
        title = "Two"
        start = "gate"

        [chapter.nodes.gate]
        dialogue = [{ speaker = "Guard", text = "Halt." }]
    "#;
    match Story::from_toml_str(toml, Path::new("fixture")) {
        Ok(story) => Arc::new(story),
        Err(e) => panic!("fixture story: {e}"),
    }
}
