use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use sled::IVec;

use crate::errors::WorldError;
use crate::seed::canonical_world_seed;
use crate::types::{PlayerRecord, RoomRecord, PLAYER_SCHEMA_VERSION, ROOM_SCHEMA_VERSION};

const TREE_PRIMARY: &str = "mudworld";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct WorldStoreBuilder {
    path: PathBuf,
    ensure_world_seed: bool,
}

impl WorldStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ensure_world_seed: true,
        }
    }

    /// Opt out of seeding the canonical world during initialization (useful for targeted tests).
    pub fn without_world_seed(mut self) -> Self {
        self.ensure_world_seed = false;
        self
    }

    pub fn open(self) -> Result<WorldStore, WorldError> {
        WorldStore::open_with_options(self.path, self.ensure_world_seed)
    }
}

/// Sled-backed persistence for world rooms and player state.
///
/// The contract is per-entity only: each `put_*` persists one aggregate and
/// there is no cross-entity transaction. Callers that mutate several
/// aggregates choose their own save order.
pub struct WorldStore {
    _db: sled::Db,
    primary: sled::Tree,
}

impl WorldStore {
    /// Open (or create) the store rooted at `path`. When seeding is enabled
    /// the canonical starter rooms are inserted if no rooms exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, seed_world: bool) -> Result<Self, WorldError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        let store = Self { _db: db, primary };

        if seed_world {
            store.seed_world_if_needed()?;
        }

        Ok(store)
    }

    fn player_key(player_id: &str) -> Vec<u8> {
        format!("players:{}", player_id).into_bytes()
    }

    fn room_key(room_id: &str) -> Vec<u8> {
        format!("rooms:{}", room_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, WorldError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, WorldError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a player record.
    pub fn put_player(&self, mut player: PlayerRecord) -> Result<(), WorldError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        let key = Self::player_key(&player.id);
        let bytes = Self::serialize(&player)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    /// Fetch a player record by id.
    pub fn get_player(&self, player_id: &str) -> Result<PlayerRecord, WorldError> {
        let key = Self::player_key(player_id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(WorldError::NotFound(format!("player: {}", player_id)));
        };
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(WorldError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// List all player ids currently stored.
    pub fn list_player_ids(&self) -> Result<Vec<String>, WorldError> {
        self.list_ids(b"players:", "players:")
    }

    /// Insert or update a room record.
    pub fn put_room(&self, mut room: RoomRecord) -> Result<(), WorldError> {
        room.schema_version = ROOM_SCHEMA_VERSION;
        let key = Self::room_key(&room.id);
        let bytes = Self::serialize(&room)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    pub fn get_room(&self, room_id: &str) -> Result<RoomRecord, WorldError> {
        let key = Self::room_key(room_id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(WorldError::NotFound(format!("room: {}", room_id)));
        };
        let record: RoomRecord = Self::deserialize(bytes)?;
        if record.schema_version != ROOM_SCHEMA_VERSION {
            return Err(WorldError::SchemaMismatch {
                entity: "room",
                expected: ROOM_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn room_exists(&self, room_id: &str) -> Result<bool, WorldError> {
        Ok(self.primary.contains_key(Self::room_key(room_id))?)
    }

    /// List all room ids currently stored.
    pub fn list_room_ids(&self) -> Result<Vec<String>, WorldError> {
        self.list_ids(b"rooms:", "rooms:")
    }

    fn list_ids(&self, prefix: &[u8], strip: &str) -> Result<Vec<String>, WorldError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(prefix) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix(strip) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Insert the canonical starter world unless rooms already exist.
    pub fn seed_world_if_needed(&self) -> Result<usize, WorldError> {
        if self.primary.scan_prefix(b"rooms:").next().is_some() {
            return Ok(0);
        }
        let rooms = canonical_world_seed(Utc::now());
        let mut inserted = 0usize;
        for room in rooms {
            self.put_room(room)?;
            inserted += 1;
        }
        info!("seeded canonical world ({} rooms)", inserted);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::WORLD_ROOM_IDS;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_player() {
        let dir = TempDir::new().expect("tempdir");
        let store = WorldStoreBuilder::new(dir.path()).open().expect("store");
        let mut player = PlayerRecord::new("alexa-user-1", "cold_stone_room");
        player.touch();
        store.put_player(player.clone()).expect("put");
        let fetched = store.get_player("alexa-user-1").expect("get");
        assert_eq!(fetched.id, player.id);
        assert_eq!(fetched.interactions, 1);
        assert_eq!(fetched.schema_version, PLAYER_SCHEMA_VERSION);
        drop(store);
    }

    #[test]
    fn missing_records_report_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = WorldStoreBuilder::new(dir.path())
            .without_world_seed()
            .open()
            .expect("store");
        assert!(matches!(
            store.get_player("ghost"),
            Err(WorldError::NotFound(_))
        ));
        assert!(matches!(
            store.get_room("nowhere"),
            Err(WorldError::NotFound(_))
        ));
    }

    #[test]
    fn seeding_world_only_happens_once() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = WorldStoreBuilder::new(dir.path()).open().expect("store");
            let ids = store.list_player_ids().expect("list players");
            assert!(ids.is_empty());
            for room_id in WORLD_ROOM_IDS {
                store.get_room(room_id).expect("room present");
            }
        }

        let store = WorldStoreBuilder::new(dir.path())
            .without_world_seed()
            .open()
            .expect("reopen store");
        let count = store.seed_world_if_needed().expect("seed check");
        assert_eq!(count, 0, "should not reseed when rooms already exist");
        for room_id in WORLD_ROOM_IDS {
            store.get_room(room_id).expect("room persists");
        }
    }

    #[test]
    fn room_round_trip_preserves_nested_items() {
        let dir = TempDir::new().expect("tempdir");
        let store = WorldStoreBuilder::new(dir.path())
            .without_world_seed()
            .open()
            .expect("store");

        let room = crate::types::RoomRecord::new("vault", "A sealed vault.").with_item(
            crate::types::ItemRecord::new("chest", "wooden chest", "A chest.")
                .as_container()
                .with_content(crate::types::ItemRecord::new(
                    "cake",
                    "chocolate cake",
                    "Tasty.",
                )),
        );
        store.put_room(room).expect("put");

        let fetched = store.get_room("vault").expect("get");
        let chest = fetched.get_item("chest").expect("chest");
        assert_eq!(chest.contents().len(), 1);
        assert_eq!(chest.contents()[0].short_name, "cake");
        assert!(store.room_exists("vault").expect("exists"));
    }
}
