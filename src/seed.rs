//! Canonical starter world.
//!
//! Two rooms joined by a lockable north door: the cold stone room where new
//! players appear, and the chasm ledge that ends the starter scenario.
//! Operators replace this layout with their own via [`crate::seed_loader`].

use chrono::{DateTime, Utc};

use crate::types::{ExitRecord, ItemRecord, RoomRecord};

/// Entry point for new players.
pub const START_ROOM_ID: &str = "cold_stone_room";

/// Destination of the starter room's north door.
pub const CHASM_LEDGE_ID: &str = "chasm_ledge";

/// Every room the canonical seed inserts.
pub const WORLD_ROOM_IDS: &[&str] = &[START_ROOM_ID, CHASM_LEDGE_ID];

/// Build the canonical starter rooms.
///
/// The timestamps for each room are deterministic based on the `now`
/// provided so tests can supply a fixed value. Callers typically pass
/// `Utc::now()` in production paths.
pub fn canonical_world_seed(now: DateTime<Utc>) -> Vec<RoomRecord> {
    let mut rooms = Vec::new();

    let start = RoomRecord::new(START_ROOM_ID, "You are in a cold stone room.")
        .with_created_at(now)
        .with_hint("Try getting a key from the key dispenser and opening the north door with it.")
        .with_item(
            ItemRecord::new(
                "sign",
                "help sign",
                "The sign reads: say 'help me' for instructions or say 'hint please'.",
            )
            .with_getable(false)
            .with_created_at(now),
        )
        .with_item(
            ItemRecord::new(
                "key dispenser",
                "key dispenser",
                "You see a matte black forearm length cylinder in the center of the room \
with a pulsing blue light emanating from the top. It has instructions that read: \
Say 'get key from key dispenser'.",
            )
            .with_getable(false)
            .as_container()
            .with_tag("dispenser")
            .with_hint("To use the key dispenser, say the phrase: 'get key from key dispenser'.")
            .with_content(
                ItemRecord::new("key", "brass key", "A small brass key, still warm.")
                    .with_created_at(now),
            )
            .with_created_at(now),
        )
        .with_exit("north", ExitRecord::to(CHASM_LEDGE_ID).lockable());
    rooms.push(start);

    let ledge = RoomRecord::new(
        CHASM_LEDGE_ID,
        "You are standing on a thin ledge that looks down into a great chasm \
with no bottom in sight.",
    )
    .with_created_at(now)
    .with_hint("Congratulations. You won the game.")
    .with_item(
        ItemRecord::new(
            "trophy",
            "winner's trophy",
            "The trophy is made of cheap tin and is poorly mounted to a plate that \
reads: 'Congratulations. You won the game.'",
        )
        .with_getable(false)
        .with_created_at(now),
    )
    .with_item(
        ItemRecord::new(
            "chest",
            "wooden chest",
            "A simple wooden chest. I wonder what's inside.",
        )
        .with_getable(false)
        .as_container()
        .with_hint("Try the phrases 'look in chest', 'put something in chest', or 'get something from chest'.")
        .with_content(
            ItemRecord::new(
                "cake",
                "chocolate cake",
                "A rich chocolate cake with dark chocolate frosting. Mmmm... Tasty.",
            )
            .as_ingestable()
            .with_uses(3)
            .with_hint("Try 'eat cake' or look at it to see how many portions are left.")
            .with_created_at(now),
        )
        .with_created_at(now),
    )
    .with_item(
        ItemRecord::new(
            "trashcan",
            "bottomless trashcan",
            "This trashcan has no bottom! Anything you put in it will disappear.",
        )
        .with_getable(false)
        .as_container()
        .with_tag("trashcan")
        .with_hint("To use the trashcan, say the phrase: 'put key in trashcan'.")
        .with_created_at(now),
    )
    .with_exit("south", ExitRecord::to(START_ROOM_ID));
    rooms.push(ledge);

    rooms
}
