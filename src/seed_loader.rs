//! JSON world-seed loading.
//!
//! Operators describe rooms, exits, and (arbitrarily nested) items in a
//! JSON file and install them without recompiling. The seed format is a
//! slimmed-down mirror of the record types: everything except ids,
//! descriptions, and exit destinations is optional.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::WorldError;
use crate::storage::WorldStore;
use crate::types::{ExitRecord, ItemRecord, RoomRecord};

#[derive(Debug, Deserialize)]
struct RoomSeed {
    id: String,
    description: String,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    exits: HashMap<String, ExitSeed>,
    #[serde(default)]
    items: Vec<ItemSeed>,
}

#[derive(Debug, Deserialize)]
struct ExitSeed {
    to: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    lockable: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ItemSeed {
    short_name: String,
    full_name: String,
    description: String,
    #[serde(default)]
    hint: Option<String>,
    /// Defaults to true, matching freshly constructed items.
    #[serde(default = "default_true")]
    getable: bool,
    #[serde(default)]
    container: bool,
    #[serde(default)]
    usable: bool,
    #[serde(default)]
    ingestable: bool,
    #[serde(default)]
    uses_left: Option<u32>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    contents: Vec<ItemSeed>,
}

fn default_true() -> bool {
    true
}

fn build_item(seed: ItemSeed) -> ItemRecord {
    let mut item = ItemRecord::new(&seed.short_name, &seed.full_name, &seed.description);
    if let Some(hint) = seed.hint {
        item.hint = hint;
    }
    item.is_getable = seed.getable;
    item.is_container = seed.container;
    item.is_usable = seed.usable;
    item.is_ingestable = seed.ingestable;
    if let Some(uses) = seed.uses_left {
        item.uses_left = uses;
    }
    if seed.hidden {
        item.is_visible = false;
    }
    for tag in seed.tags {
        item.add_tag_if_not_exists(&tag);
    }
    for nested in seed.contents {
        item.contents.push(build_item(nested));
    }
    item
}

fn build_exit(seed: ExitSeed) -> ExitRecord {
    let mut exit = ExitRecord::to(&seed.to);
    if let Some(description) = seed.description {
        exit.description = description;
    }
    exit.is_lockable = seed.lockable || seed.locked;
    exit.is_locked = seed.locked;
    exit.is_visible = !seed.hidden;
    for tag in seed.tags {
        exit.add_tag_if_not_exists(&tag);
    }
    exit
}

fn build_room(seed: RoomSeed) -> RoomRecord {
    let mut room = RoomRecord::new(&seed.id, &seed.description);
    if let Some(hint) = seed.hint {
        room.hint = hint;
    }
    for (direction, exit) in seed.exits {
        room.exits.insert(direction, build_exit(exit));
    }
    for item in seed.items {
        room.add_item(build_item(item));
    }
    room
}

/// Parse a JSON array of room seeds.
pub fn rooms_from_json_str(contents: &str) -> Result<Vec<RoomRecord>, WorldError> {
    let seeds: Vec<RoomSeed> = serde_json::from_str(contents).map_err(|e| {
        WorldError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("failed to parse room seeds: {}", e),
        ))
    })?;
    Ok(seeds.into_iter().map(build_room).collect())
}

/// Load room seeds from a JSON file.
pub fn load_rooms_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<RoomRecord>, WorldError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    rooms_from_json_str(&contents).map_err(|e| match e {
        WorldError::Io(inner) => WorldError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), inner),
        )),
        other => other,
    })
}

/// Insert every room into the store. Returns the number installed.
pub fn install_rooms(store: &WorldStore, rooms: Vec<RoomRecord>) -> Result<usize, WorldError> {
    let mut installed = 0usize;
    for room in rooms {
        store.put_room(room)?;
        installed += 1;
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::WorldStoreBuilder;
    use tempfile::TempDir;

    const SEED_JSON: &str = r#"[
        {
            "id": "wine_cellar",
            "description": "A damp cellar lined with empty racks.",
            "hint": "Something is hidden down here.",
            "exits": {
                "up": { "to": "kitchen" },
                "north": { "to": "vault", "locked": true }
            },
            "items": [
                {
                    "short_name": "barrel",
                    "full_name": "oak barrel",
                    "description": "An oak barrel, smelling of vinegar.",
                    "getable": false,
                    "container": true,
                    "contents": [
                        {
                            "short_name": "biscuit",
                            "full_name": "stale biscuit",
                            "description": "Hard as a rock.",
                            "ingestable": true,
                            "uses_left": 2
                        }
                    ]
                },
                {
                    "short_name": "hatch",
                    "full_name": "rusty hatch",
                    "description": "A hatch in the floor.",
                    "getable": false,
                    "hidden": true
                }
            ]
        },
        {
            "id": "kitchen",
            "description": "A cold kitchen.",
            "exits": { "down": { "to": "wine_cellar" } }
        }
    ]"#;

    #[test]
    fn parses_rooms_exits_and_nested_items() {
        let rooms = rooms_from_json_str(SEED_JSON).expect("parse");
        assert_eq!(rooms.len(), 2);

        let cellar = rooms.iter().find(|r| r.id == "wine_cellar").expect("cellar");
        assert_eq!(cellar.hint, "Something is hidden down here.");
        assert_eq!(cellar.exit_destination("up"), Some("kitchen"));
        let vault_door = cellar.exits.get("north").expect("north");
        assert!(vault_door.is_locked);
        assert!(vault_door.is_lockable);

        let barrel = cellar.get_item("barrel").expect("barrel");
        assert!(barrel.is_container);
        assert!(!barrel.is_getable);
        let biscuit = &barrel.contents()[0];
        assert!(biscuit.is_ingestable);
        assert_eq!(biscuit.uses_left, 2);
        assert!(biscuit.is_getable, "getable defaults to true");

        let hatch = cellar.get_item("hatch").expect("hatch");
        assert!(!hatch.is_visible);
    }

    #[test]
    fn installs_rooms_into_a_store() {
        let dir = TempDir::new().expect("tempdir");
        let store = WorldStoreBuilder::new(dir.path())
            .without_world_seed()
            .open()
            .expect("store");
        let rooms = rooms_from_json_str(SEED_JSON).expect("parse");
        let installed = install_rooms(&store, rooms).expect("install");
        assert_eq!(installed, 2);
        assert!(store.room_exists("wine_cellar").expect("exists"));
        assert!(store.room_exists("kitchen").expect("exists"));
    }

    #[test]
    fn rejects_malformed_seeds() {
        let result = rooms_from_json_str("{ not json ");
        assert!(matches!(result, Err(WorldError::Io(_))));
    }
}
