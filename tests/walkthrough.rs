/// End-to-end scenarios driving the public API against a throwaway store:
/// the two-key walkthrough, movement round trips, and presence tracking.
use tempfile::TempDir;

use mudworld::{
    ExitRecord, ItemRecord, RoomRecord, SearchFilters, SearchScope, WorldError, WorldManager,
    WorldStoreBuilder,
};

const CELL_ID: &str = "guard_cell";
const YARD_ID: &str = "prison_yard";

/// A two-room loop with two similarly named keys in the north room,
/// mirroring the starter scenario's door puzzle.
fn two_key_world() -> (WorldManager, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let store = WorldStoreBuilder::new(dir.path()).open().expect("store");

    let yard = RoomRecord::new(YARD_ID, "A walled yard, open to a grey sky.")
        .with_item(ItemRecord::new("key", "brass key", "A small brass key."))
        .with_item(ItemRecord::new("key 2", "iron key", "A heavy iron key."))
        .with_exit("south", ExitRecord::to(CELL_ID));
    let cell = RoomRecord::new(CELL_ID, "A cramped cell with a barred window.")
        .with_exit("north", ExitRecord::to(YARD_ID).lockable());

    store.put_room(yard).expect("put yard");
    store.put_room(cell).expect("put cell");

    let manager = WorldManager::new(store);
    (manager, dir)
}

/// Create a player and relocate them from the canonical start room into
/// the given test room.
fn player_in(manager: &WorldManager, user_id: &str, room_id: &str) -> mudworld::PlayerRecord {
    let mut player = manager.get_or_create_player(user_id).expect("player");
    let mut start = manager
        .store()
        .get_room(&player.current_room)
        .expect("start room");
    start.remove_player(&player.id);
    manager.store().put_room(start).expect("put");

    player.current_room = room_id.to_string();
    let mut room = manager.store().get_room(room_id).expect("room");
    room.add_player(&player.id);
    manager.store().put_room(room).expect("put");
    manager.store().put_player(player.clone()).expect("put");
    player
}

fn player_in_cell(manager: &WorldManager) -> mudworld::PlayerRecord {
    player_in(manager, "alexa-user-1", CELL_ID)
}

#[test]
fn two_key_walkthrough() {
    let (manager, _dir) = two_key_world();
    let mut player = player_in_cell(&manager);

    manager.player_move(&mut player, "north").expect("go north");
    manager.player_get(&mut player, "key 2").expect("get key 2");
    manager.player_get(&mut player, "key").expect("get key");
    assert_eq!(player.inventory_size(), 2);

    manager.player_move(&mut player, "south").expect("go south");
    manager.player_drop(&mut player, "key").expect("drop key");

    // The key is gone from the inventory, so dropping again misses.
    match manager.player_drop(&mut player, "key") {
        Err(WorldError::NotFound(_)) => {}
        other => panic!("second drop should be NotFound, got {:?}", other),
    }

    assert_eq!(player.inventory_size(), 1);
    assert!(player.get_item("key 2").is_some());
    let cell = manager.store().get_room(CELL_ID).expect("cell");
    assert!(cell.get_item("key").is_some());
}

#[test]
fn exact_key_resolution_does_not_conflate_key_and_key_2() {
    let (manager, _dir) = two_key_world();
    let player = manager.get_or_create_player("alexa-user-1").expect("player");
    let yard = manager.store().get_room(YARD_ID).expect("yard");

    let result = mudworld::search(
        &player,
        &yard,
        "key",
        &SearchFilters::default(),
        &SearchScope::room_items(),
    );
    assert_eq!(result.found, 1);
    assert_eq!(result.room_items[0].short_name, "key");
}

#[test]
fn move_round_trip_restores_presence_sets() {
    let (manager, _dir) = two_key_world();
    let mut player = player_in_cell(&manager);

    manager.player_move(&mut player, "north").expect("go north");
    {
        let cell = manager.store().get_room(CELL_ID).expect("cell");
        let yard = manager.store().get_room(YARD_ID).expect("yard");
        assert!(!cell.has_player(&player.id));
        assert!(yard.has_player(&player.id));
    }

    manager.player_move(&mut player, "south").expect("go south");
    assert_eq!(player.current_room, CELL_ID);
    let cell = manager.store().get_room(CELL_ID).expect("cell");
    let yard = manager.store().get_room(YARD_ID).expect("yard");
    assert!(cell.has_player(&player.id));
    assert!(!yard.has_player(&player.id));
    assert_eq!(cell.players.len(), 1);
    assert!(yard.players.is_empty());
}

#[test]
fn get_then_drop_round_trip_is_lossless() {
    let (manager, _dir) = two_key_world();
    let mut player = player_in_cell(&manager);
    manager.player_move(&mut player, "north").expect("go north");

    let items_before = manager.store().get_room(YARD_ID).expect("yard").items.len();
    let carried_before = player.inventory_size();

    manager.player_get(&mut player, "key").expect("get");
    manager.player_drop(&mut player, "key").expect("drop");

    let yard = manager.store().get_room(YARD_ID).expect("yard");
    assert_eq!(yard.items.len(), items_before);
    assert!(yard.get_item("key").is_some());
    assert_eq!(player.inventory_size(), carried_before);
}

#[test]
fn locked_exits_block_movement_until_unlocked() {
    let (manager, _dir) = two_key_world();
    let mut player = player_in_cell(&manager);

    let mut cell = manager.store().get_room(CELL_ID).expect("cell");
    if let Some(exit) = cell.exits.get_mut("north") {
        exit.is_locked = true;
    }
    manager.store().put_room(cell).expect("put");

    match manager.player_move(&mut player, "north") {
        Err(WorldError::NotPermitted(_)) => {}
        other => panic!("locked exit should be NotPermitted, got {:?}", other),
    }
    assert_eq!(player.current_room, CELL_ID);

    let mut cell = manager.store().get_room(CELL_ID).expect("cell");
    if let Some(exit) = cell.exits.get_mut("north") {
        exit.is_locked = false;
    }
    manager.store().put_room(cell).expect("put");
    manager.player_move(&mut player, "north").expect("go north");
    assert_eq!(player.current_room, YARD_ID);
}

#[test]
fn two_players_share_one_world() {
    let (manager, _dir) = two_key_world();
    let mut alice = player_in_cell(&manager);
    let mut bob = player_in(&manager, "alexa-user-2", YARD_ID);

    // Bob takes the brass key first; Alice's grab then misses.
    manager.player_get(&mut bob, "key").expect("bob gets key");
    manager.player_move(&mut alice, "north").expect("alice north");
    match manager.player_get(&mut alice, "key") {
        Err(WorldError::NotFound(_)) => {}
        other => panic!("key already taken, got {:?}", other),
    }
    manager.player_get(&mut alice, "key 2").expect("alice gets key 2");

    let yard = manager.store().get_room(YARD_ID).expect("yard");
    assert!(yard.items.is_empty());
    assert!(yard.has_player(&alice.id));
    assert!(yard.has_player(&bob.id));
}
