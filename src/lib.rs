//! # Mudworld - world engine for a turn-based multiuser dungeon
//!
//! Mudworld is the world half of a voice-driven MUD: a graph of rooms
//! connected by exits, populated with nestable items and visited by players
//! who carry inventories. It resolves the short free-text specs a command
//! layer extracts ("key", "key dispenser", "north") to concrete objects and
//! applies the state transitions (move, get, drop, put, ingest) that act on
//! them. Everything conversational - intent parsing, response phrasing,
//! reprompts - lives outside this crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudworld::{WorldManager, WorldStore};
//!
//! fn main() -> Result<(), mudworld::WorldError> {
//!     // Open (and on first run, seed) the world.
//!     let store = WorldStore::open("data/world")?;
//!     let manager = WorldManager::new(store);
//!
//!     // Players are created lazily from the platform-supplied user id.
//!     let mut player = manager.get_or_create_player("alexa-user-1")?;
//!     manager.player_get_from(&mut player, "key", "key dispenser")?;
//!     manager.player_move(&mut player, "north")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`types`] - Room, exit, item, and player records
//! - [`resolver`] - free-text spec resolution across inventory, room, and exits
//! - [`manager`] - state-transition operations (move, get, drop, put, ingest, search)
//! - [`storage`] - sled-backed world persistence
//! - [`locks`] - per-room lock registry serializing same-room operations
//! - [`seed`] / [`seed_loader`] - canonical starter world and JSON seeds

pub mod errors;
pub mod locks;
pub mod manager;
pub mod resolver;
pub mod seed;
pub mod seed_loader;
pub mod storage;
pub mod types;

pub use errors::WorldError;
pub use locks::RoomLocks;
pub use manager::WorldManager;
pub use resolver::{search, SearchFilters, SearchResult, SearchScope};
pub use seed::{canonical_world_seed, CHASM_LEDGE_ID, START_ROOM_ID, WORLD_ROOM_IDS};
pub use seed_loader::{install_rooms, load_rooms_from_json, rooms_from_json_str};
pub use storage::{WorldStore, WorldStoreBuilder};
pub use types::*;
