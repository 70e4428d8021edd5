use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::WorldError;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const ROOM_SCHEMA_VERSION: u8 = 1;

/// A game object. Items live in a room, in a player's inventory, or nested
/// inside a container item; containment is acyclic by construction because
/// `contents` owns its values outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    /// Primary lookup key within a scope ("key", "key dispenser").
    pub short_name: String,
    /// Secondary multi-word match key ("brass key", "winner's trophy").
    pub full_name: String,
    pub description: String,
    #[serde(default)]
    pub hint: String,
    pub is_getable: bool,
    pub is_container: bool,
    pub is_usable: bool,
    pub is_ingestable: bool,
    /// Remaining uses; 0 means exhausted.
    #[serde(default)]
    pub uses_left: u32,
    /// Behavioral hooks ("dispenser", "trashcan").
    #[serde(default)]
    pub tags: Vec<String>,
    /// Nested items, only meaningful when `is_container` is set.
    #[serde(default)]
    pub contents: Vec<ItemRecord>,
    /// When false, only players on the `visible_to` allowlist perceive the item.
    pub is_visible: bool,
    #[serde(default)]
    pub visible_to: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn new(short_name: &str, full_name: &str, description: &str) -> Self {
        Self {
            short_name: short_name.to_string(),
            full_name: full_name.to_string(),
            description: description.to_string(),
            hint: String::new(),
            is_getable: true,
            is_container: false,
            is_usable: false,
            is_ingestable: false,
            uses_left: 1,
            tags: Vec::new(),
            contents: Vec::new(),
            is_visible: true,
            visible_to: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = hint.to_string();
        self
    }

    pub fn with_getable(mut self, getable: bool) -> Self {
        self.is_getable = getable;
        self
    }

    pub fn as_container(mut self) -> Self {
        self.is_container = true;
        self
    }

    pub fn as_usable(mut self) -> Self {
        self.is_usable = true;
        self
    }

    pub fn as_ingestable(mut self) -> Self {
        self.is_ingestable = true;
        self
    }

    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_left = uses;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.add_tag_if_not_exists(tag);
        self
    }

    pub fn with_content(mut self, item: ItemRecord) -> Self {
        self.contents.push(item);
        self
    }

    /// Hide the item from everyone not on the allowlist.
    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Place an item inside this one. Errors on a non-container.
    pub fn add_content(&mut self, item: ItemRecord) -> Result<(), WorldError> {
        if !self.is_container {
            return Err(WorldError::NotPermitted(format!(
                "{} is not a container",
                self.short_name
            )));
        }
        self.contents.push(item);
        Ok(())
    }

    pub fn contents(&self) -> &[ItemRecord] {
        &self.contents
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn add_tag_if_not_exists(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag_if_exists(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn is_visible_to(&self, player_id: &str) -> bool {
        self.is_visible || self.visible_to.iter().any(|p| p == player_id)
    }

    /// Add the player to the allowlist so they perceive a hidden item.
    pub fn reveal_to(&mut self, player_id: &str) {
        if !self.is_visible_to(player_id) {
            self.visible_to.push(player_id.to_string());
        }
    }

    pub fn has_uses_left(&self) -> bool {
        self.uses_left > 0
    }

    /// Spend one use and return how many remain.
    pub fn spend_use(&mut self) -> u32 {
        self.uses_left = self.uses_left.saturating_sub(1);
        self.uses_left
    }

    /// Recursively search this item's contents for `short_name`.
    pub fn find_content_mut(&mut self, short_name: &str) -> Option<&mut ItemRecord> {
        find_in_contents_mut(&mut self.contents, short_name)
    }
}

fn find_in_contents_mut<'a>(
    items: &'a mut Vec<ItemRecord>,
    short_name: &str,
) -> Option<&'a mut ItemRecord> {
    for item in items.iter_mut() {
        if item.short_name == short_name {
            return Some(item);
        }
        if item.is_container {
            if let Some(found) = find_in_contents_mut(&mut item.contents, short_name) {
                return Some(found);
            }
        }
    }
    None
}

fn take_from_contents(items: &mut Vec<ItemRecord>, short_name: &str) -> Option<ItemRecord> {
    if let Some(pos) = items.iter().position(|i| i.short_name == short_name) {
        return Some(items.remove(pos));
    }
    for item in items.iter_mut() {
        if item.is_container {
            if let Some(found) = take_from_contents(&mut item.contents, short_name) {
                return Some(found);
            }
        }
    }
    None
}

/// A directed link from one room to another. The destination is a room id,
/// not an owning handle: rooms reference each other through exits and the
/// graph is cyclic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExitRecord {
    pub destination: String,
    pub description: String,
    pub is_lockable: bool,
    pub is_locked: bool,
    /// When false, only players on the `visible_to` allowlist perceive the exit.
    pub is_visible: bool,
    #[serde(default)]
    pub visible_to: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub last_used: Option<DateTime<Utc>>,
}

impl ExitRecord {
    pub fn to(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            description: "You can't see too well that way.".to_string(),
            is_lockable: false,
            is_locked: false,
            is_visible: true,
            visible_to: Vec::new(),
            tags: Vec::new(),
            last_used: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn lockable(mut self) -> Self {
        self.is_lockable = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.is_lockable = true;
        self.is_locked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.add_tag_if_not_exists(tag);
        self
    }

    pub fn is_visible_to(&self, player_id: &str) -> bool {
        self.is_visible || self.visible_to.iter().any(|p| p == player_id)
    }

    /// Add the player to the allowlist so they perceive a hidden exit.
    pub fn reveal_to(&mut self, player_id: &str) {
        if !self.is_visible_to(player_id) {
            self.visible_to.push(player_id.to_string());
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn add_tag_if_not_exists(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag_if_exists(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn update_last_used(&mut self) {
        self.last_used = Some(Utc::now());
    }
}

/// A location in the world. Rooms own their items and exits; the presence
/// set holds player ids, never player records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomRecord {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub hint: String,
    /// Items keyed by short name.
    #[serde(default)]
    pub items: HashMap<String, ItemRecord>,
    /// Exits keyed by direction ("north", "south", ...).
    #[serde(default)]
    pub exits: HashMap<String, ExitRecord>,
    /// Ids of players currently in the room.
    #[serde(default)]
    pub players: Vec<String>,
    pub last_visited: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl RoomRecord {
    pub fn new(id: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            description: description.to_string(),
            hint: String::new(),
            items: HashMap::new(),
            exits: HashMap::new(),
            players: Vec::new(),
            last_visited: now,
            created_at: now,
            schema_version: ROOM_SCHEMA_VERSION,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = hint.to_string();
        self
    }

    pub fn with_item(mut self, item: ItemRecord) -> Self {
        self.add_item(item);
        self
    }

    pub fn with_exit(mut self, direction: &str, exit: ExitRecord) -> Self {
        self.exits.insert(direction.to_string(), exit);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.last_visited = created_at;
        self
    }

    /// Insert an item, keyed by its short name.
    pub fn add_item(&mut self, item: ItemRecord) {
        self.items.insert(item.short_name.clone(), item);
    }

    /// Remove and return the top-level item with this exact short name.
    pub fn remove_item(&mut self, short_name: &str) -> Option<ItemRecord> {
        self.items.remove(short_name)
    }

    pub fn get_item(&self, short_name: &str) -> Option<&ItemRecord> {
        self.items.get(short_name)
    }

    /// Recursively search the room's items, descending into containers.
    pub fn find_item_mut(&mut self, short_name: &str) -> Option<&mut ItemRecord> {
        for item in self.items.values_mut() {
            if item.short_name == short_name {
                return Some(item);
            }
            if item.is_container {
                if let Some(found) = find_in_contents_mut(&mut item.contents, short_name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Remove and return an item from the room or from any nested container.
    pub fn take_item_deep(&mut self, short_name: &str) -> Option<ItemRecord> {
        if let Some(item) = self.items.remove(short_name) {
            return Some(item);
        }
        for item in self.items.values_mut() {
            if item.is_container {
                if let Some(found) = take_from_contents(&mut item.contents, short_name) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn add_player(&mut self, player_id: &str) {
        if !self.players.iter().any(|p| p == player_id) {
            self.players.push(player_id.to_string());
        }
    }

    pub fn remove_player(&mut self, player_id: &str) {
        self.players.retain(|p| p != player_id);
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    /// Plain map lookup. Visibility and lock checks are the caller's job;
    /// the room performs no filtering.
    pub fn exit_destination(&self, direction: &str) -> Option<&str> {
        self.exits.get(direction).map(|e| e.destination.as_str())
    }

    pub fn update_last_visited(&mut self) {
        self.last_visited = Utc::now();
    }
}

/// An actor. The room reference is an id; the inventory owns its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    /// Platform-supplied user id.
    pub id: String,
    pub current_room: String,
    /// Inventory keyed by item short name.
    #[serde(default)]
    pub inventory: HashMap<String, ItemRecord>,
    pub interactions: u64,
    /// True only until the first interaction completes.
    pub is_new: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(id: &str, starting_room: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            current_room: starting_room.to_string(),
            inventory: HashMap::new(),
            interactions: 0,
            is_new: true,
            last_seen: now,
            created_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    /// Insert an item, keyed by its short name.
    pub fn add_item(&mut self, item: ItemRecord) {
        self.inventory.insert(item.short_name.clone(), item);
    }

    /// Remove and return the inventory item with this exact short name.
    pub fn remove_item(&mut self, short_name: &str) -> Option<ItemRecord> {
        self.inventory.remove(short_name)
    }

    pub fn get_item(&self, short_name: &str) -> Option<&ItemRecord> {
        self.inventory.get(short_name)
    }

    pub fn inventory_size(&self) -> usize {
        self.inventory.len()
    }

    /// Recursively search the inventory, descending into containers.
    pub fn find_item_mut(&mut self, short_name: &str) -> Option<&mut ItemRecord> {
        for item in self.inventory.values_mut() {
            if item.short_name == short_name {
                return Some(item);
            }
            if item.is_container {
                if let Some(found) = find_in_contents_mut(&mut item.contents, short_name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Remove and return an item from the inventory or from any nested container.
    pub fn take_item_deep(&mut self, short_name: &str) -> Option<ItemRecord> {
        if let Some(item) = self.inventory.remove(short_name) {
            return Some(item);
        }
        for item in self.inventory.values_mut() {
            if item.is_container {
                if let Some(found) = take_from_contents(&mut item.contents, short_name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Bump the interaction counter and last-seen timestamp.
    pub fn touch(&mut self) {
        self.interactions += 1;
        self.last_seen = Utc::now();
    }
}
