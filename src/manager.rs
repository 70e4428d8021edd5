//! State-transition operations on the world.
//!
//! Every operation here is a two-aggregate transition: a source loses an
//! object and a destination gains it, and both aggregates (plus the player)
//! are persisted. The destination aggregate is always saved before the
//! source, so a partial persistence failure can leave an object present on
//! both sides, never on neither. The store contract is per-entity with no
//! cross-entity transaction; in-memory changes already applied are NOT
//! rolled back when a later save fails. That inconsistency window is a
//! deliberate, documented limitation.
//!
//! Operations acquire the per-room locks for every room they touch (sorted
//! order, see [`crate::locks`]) and re-read records under lock, so
//! concurrent turns against the same room serialize while disjoint rooms
//! proceed in parallel. Exclusive access to the player is the `&mut
//! PlayerRecord` borrow itself.

use log::{debug, info};

use crate::errors::WorldError;
use crate::locks::RoomLocks;
use crate::resolver::{self, SearchFilters, SearchScope};
use crate::seed::START_ROOM_ID;
use crate::storage::WorldStore;
use crate::types::{ItemRecord, PlayerRecord, RoomRecord};

const TAG_DISPENSER: &str = "dispenser";
const TAG_TRASHCAN: &str = "trashcan";

/// Mutator for world state: movement, item transfer, consumption, and
/// lazy player creation. Bundles the persistence handle with the per-room
/// lock registry.
pub struct WorldManager {
    store: WorldStore,
    locks: RoomLocks,
}

impl WorldManager {
    pub fn new(store: WorldStore) -> Self {
        Self {
            store,
            locks: RoomLocks::new(),
        }
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    /// Fetch the player, creating them at the start room on first contact.
    /// New players keep `is_new` until [`Self::finish_first_contact`].
    pub fn get_or_create_player(&self, user_id: &str) -> Result<PlayerRecord, WorldError> {
        match self.store.get_player(user_id) {
            Ok(player) => Ok(player),
            Err(WorldError::NotFound(_)) => {
                info!("new player with user id {}", user_id);
                let player = PlayerRecord::new(user_id, START_ROOM_ID);
                self.locks.with_rooms_locked(&[START_ROOM_ID], || {
                    let mut start = self.store.get_room(START_ROOM_ID)?;
                    start.add_player(user_id);
                    self.store.put_room(start)?;
                    self.store.put_player(player.clone())
                })?;
                Ok(player)
            }
            Err(e) => Err(e),
        }
    }

    /// Clear the first-contact flag. Returns true when the flag was set,
    /// so the caller knows to deliver its one-time greeting.
    pub fn finish_first_contact(&self, player: &mut PlayerRecord) -> Result<bool, WorldError> {
        if !player.is_new {
            return Ok(false);
        }
        player.is_new = false;
        self.store.put_player(player.clone())?;
        Ok(true)
    }

    /// Move the player through an exit of their current room.
    ///
    /// NotFound when the direction has no exit or the exit is hidden from
    /// this player; NotPermitted when it is locked. Updates both rooms'
    /// presence sets, the destination's last-visited stamp, the exit's
    /// last-used stamp, and the player's room reference.
    pub fn player_move(&self, player: &mut PlayerRecord, direction: &str) -> Result<(), WorldError> {
        let source_id = player.current_room.clone();

        // Peek outside the locks to learn the destination, then take both
        // locks in sorted order and re-read.
        let dest_id = {
            let source = self.store.get_room(&source_id)?;
            visible_exit_destination(&source, player, direction)?
        };

        self.locks.with_rooms_locked(&[source_id.as_str(), dest_id.as_str()], || {
            let mut source = self.store.get_room(&source_id)?;
            if visible_exit_destination(&source, player, direction)? != dest_id {
                // Retargeted between the peek and the lock; the lock we
                // hold no longer covers the real destination.
                return Err(WorldError::NotFound(format!("exit: {}", direction)));
            }
            let mut dest = self.store.get_room(&dest_id)?;

            dest.add_player(&player.id);
            dest.update_last_visited();
            self.store.put_room(dest)?;

            source.remove_player(&player.id);
            if let Some(exit) = source.exits.get_mut(direction) {
                exit.update_last_used();
            }
            self.store.put_room(source)?;

            player.current_room = dest_id.clone();
            player.touch();
            self.store.put_player(player.clone())?;

            debug!(
                "player {} moved {} from {} to {}",
                player.id, direction, source_id, dest_id
            );
            Ok(())
        })
    }

    /// Pick up an item from the current room by exact short name.
    pub fn player_get(&self, player: &mut PlayerRecord, spec: &str) -> Result<(), WorldError> {
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            let item = match room.get_item(spec) {
                None => return Err(WorldError::NotFound(format!("item: {}", spec))),
                Some(i) if !i.is_visible_to(&player.id) => {
                    return Err(WorldError::NotFound(format!("item: {}", spec)))
                }
                Some(i) if !i.is_getable => {
                    return Err(WorldError::NotPermitted(format!("{} cannot be taken", spec)))
                }
                Some(_) => room
                    .remove_item(spec)
                    .ok_or_else(|| WorldError::NotFound(format!("item: {}", spec)))?,
            };

            player.add_item(item);
            player.touch();
            self.store.put_player(player.clone())?;
            self.store.put_room(room)?;
            debug!("player {} got {} in {}", player.id, spec, room_id);
            Ok(())
        })
    }

    /// Drop an inventory item into the current room.
    pub fn player_drop(&self, player: &mut PlayerRecord, spec: &str) -> Result<(), WorldError> {
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            let Some(item) = player.remove_item(spec) else {
                return Err(WorldError::NotFound(format!("item: {}", spec)));
            };
            room.add_item(item);
            self.store.put_room(room)?;
            player.touch();
            self.store.put_player(player.clone())?;
            debug!("player {} dropped {} in {}", player.id, spec, room_id);
            Ok(())
        })
    }

    /// Put an inventory item into a container, searched by exact short name
    /// in the inventory first and then the current room. A container tagged
    /// "trashcan" destroys the item instead of storing it.
    pub fn player_put(
        &self,
        player: &mut PlayerRecord,
        spec: &str,
        container_spec: &str,
    ) -> Result<(), WorldError> {
        if spec == container_spec {
            return Err(WorldError::NotPermitted(format!(
                "{} cannot contain itself",
                spec
            )));
        }
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            if player.get_item(spec).is_none() {
                return Err(WorldError::NotFound(format!("item: {}", spec)));
            }

            let container_carried = player.inventory.contains_key(container_spec);
            let container = if container_carried {
                player.inventory.get(container_spec)
            } else {
                room.items
                    .get(container_spec)
                    .filter(|c| c.is_visible_to(&player.id))
            };
            let Some(container) = container else {
                return Err(WorldError::NotFound(format!(
                    "container: {}",
                    container_spec
                )));
            };
            if !container.is_container {
                return Err(WorldError::NotPermitted(format!(
                    "{} is not a container",
                    container_spec
                )));
            }
            let into_trash = container.has_tag(TAG_TRASHCAN);

            // Lookups done; now perform the transfer.
            let Some(item) = player.remove_item(spec) else {
                return Err(WorldError::NotFound(format!("item: {}", spec)));
            };
            if into_trash {
                info!(
                    "player {} trashed {} in {}",
                    player.id, spec, container_spec
                );
            } else if container_carried {
                let container = player.inventory.get_mut(container_spec).ok_or_else(|| {
                    WorldError::NotFound(format!("container: {}", container_spec))
                })?;
                container.add_content(item)?;
            } else {
                let container = room.items.get_mut(container_spec).ok_or_else(|| {
                    WorldError::NotFound(format!("container: {}", container_spec))
                })?;
                container.add_content(item)?;
            }

            if !container_carried {
                self.store.put_room(room)?;
            }
            player.touch();
            self.store.put_player(player.clone())?;
            Ok(())
        })
    }

    /// Take an item out of a container by exact short name. The container
    /// is searched in the inventory first and then the current room. A
    /// container tagged "dispenser" hands out a copy and keeps its stock.
    pub fn player_get_from(
        &self,
        player: &mut PlayerRecord,
        spec: &str,
        container_spec: &str,
    ) -> Result<(), WorldError> {
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            let container_carried = player.inventory.contains_key(container_spec);

            let item = if container_carried {
                let Some(container) = player.inventory.get_mut(container_spec) else {
                    return Err(WorldError::NotFound(format!(
                        "container: {}",
                        container_spec
                    )));
                };
                take_or_dispense(container, spec, &player.id)?
            } else {
                let container = match room.items.get_mut(container_spec) {
                    Some(c) if c.is_visible_to(&player.id) => c,
                    _ => {
                        return Err(WorldError::NotFound(format!(
                            "container: {}",
                            container_spec
                        )))
                    }
                };
                take_or_dispense(container, spec, &player.id)?
            };

            player.add_item(item);
            player.touch();
            self.store.put_player(player.clone())?;
            if !container_carried {
                self.store.put_room(room)?;
            }
            debug!(
                "player {} got {} from {}",
                player.id, spec, container_spec
            );
            Ok(())
        })
    }

    /// Consume one use of an ingestable item carried by the player or
    /// present in the room (full-name matching included, so nested items
    /// are reachable by their full names). Returns the uses remaining; an
    /// exhausted item is removed. An ambiguous spec is surfaced to the
    /// caller, never auto-resolved.
    pub fn player_ingest(&self, player: &mut PlayerRecord, spec: &str) -> Result<u32, WorldError> {
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            let filters = SearchFilters::default().ingestable(true).uses_left(true);
            let scope = SearchScope::carried_or_nearby().with_full_name();

            let (carried, short_name) = {
                let result = resolver::search(player, &room, spec, &filters, &scope);
                if result.found == 0 {
                    return Err(WorldError::NotFound(format!("item: {}", spec)));
                }
                if result.found > 1 {
                    return Err(WorldError::Ambiguous {
                        spec: spec.to_string(),
                        found: result.found,
                        player_items: result.player_items.len(),
                        room_items: result.room_items.len(),
                        room_exits: result.room_exits.len(),
                    });
                }
                match result.player_items.first() {
                    Some(item) => (true, item.short_name.clone()),
                    None => (false, result.room_items[0].short_name.clone()),
                }
            };

            let remaining = if carried {
                let item = player
                    .find_item_mut(&short_name)
                    .ok_or_else(|| WorldError::NotFound(format!("item: {}", spec)))?;
                let remaining = item.spend_use();
                if remaining == 0 {
                    player.take_item_deep(&short_name);
                }
                remaining
            } else {
                let item = room
                    .find_item_mut(&short_name)
                    .ok_or_else(|| WorldError::NotFound(format!("item: {}", spec)))?;
                let remaining = item.spend_use();
                if remaining == 0 {
                    room.take_item_deep(&short_name);
                }
                remaining
            };

            player.touch();
            self.store.put_player(player.clone())?;
            if !carried {
                self.store.put_room(room)?;
            }
            debug!(
                "player {} ingested {} ({} uses left)",
                player.id, short_name, remaining
            );
            Ok(remaining)
        })
    }

    /// Reveal every hidden item and exit in the current room to the
    /// searching player. Returns how many things were revealed.
    pub fn player_search(&self, player: &mut PlayerRecord) -> Result<usize, WorldError> {
        let room_id = player.current_room.clone();
        self.locks.with_rooms_locked(&[room_id.as_str()], || {
            let mut room = self.store.get_room(&room_id)?;
            let mut revealed = 0usize;
            for item in room.items.values_mut() {
                revealed += reveal_item_tree(item, &player.id);
            }
            for exit in room.exits.values_mut() {
                if !exit.is_visible_to(&player.id) {
                    exit.reveal_to(&player.id);
                    revealed += 1;
                }
            }
            if revealed > 0 {
                self.store.put_room(room)?;
            }
            player.touch();
            self.store.put_player(player.clone())?;
            debug!(
                "player {} searched {} and revealed {}",
                player.id, room_id, revealed
            );
            Ok(revealed)
        })
    }
}

fn visible_exit_destination(
    room: &RoomRecord,
    player: &PlayerRecord,
    direction: &str,
) -> Result<String, WorldError> {
    let Some(exit) = room.exits.get(direction) else {
        return Err(WorldError::NotFound(format!("exit: {}", direction)));
    };
    if !exit.is_visible_to(&player.id) {
        return Err(WorldError::NotFound(format!("exit: {}", direction)));
    }
    if exit.is_locked {
        return Err(WorldError::NotPermitted(format!(
            "exit {} is locked",
            direction
        )));
    }
    Ok(exit.destination.clone())
}

fn take_or_dispense(
    container: &mut ItemRecord,
    spec: &str,
    player_id: &str,
) -> Result<ItemRecord, WorldError> {
    if !container.is_container {
        return Err(WorldError::NotPermitted(format!(
            "{} is not a container",
            container.short_name
        )));
    }
    let Some(pos) = container
        .contents
        .iter()
        .position(|i| i.short_name == spec && i.is_visible_to(player_id))
    else {
        return Err(WorldError::NotFound(format!("item: {}", spec)));
    };
    if !container.contents[pos].is_getable {
        return Err(WorldError::NotPermitted(format!("{} cannot be taken", spec)));
    }
    if container.has_tag(TAG_DISPENSER) {
        Ok(container.contents[pos].clone())
    } else {
        Ok(container.contents.remove(pos))
    }
}

fn reveal_item_tree(item: &mut ItemRecord, player_id: &str) -> usize {
    let mut revealed = 0;
    if !item.is_visible_to(player_id) {
        item.reveal_to(player_id);
        revealed += 1;
    }
    for nested in item.contents.iter_mut() {
        revealed += reveal_item_tree(nested, player_id);
    }
    revealed
}
