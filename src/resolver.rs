//! Object and exit spec resolution.
//!
//! Resolves the short free-text spec supplied by the command layer ("key",
//! "key dispenser", "north") against a player's inventory, the current
//! room's items, and the room's exits. The command layer hands over an
//! already-extracted token; nothing here parses raw sentences.
//!
//! ## Matching
//! - **Exact key lookup** against each scope's name-indexed collection.
//! - **Full-name scan** (opt-in): a linear pass comparing the spec against
//!   item full names, descending recursively into container contents so a
//!   deeply nested item ("cake" inside a chest) can be found.
//! - Hidden items and exits are only returned to players on their
//!   allowlists, whatever other filters say.
//!
//! ## Ambiguity
//! No ranking is performed. A result with `found > 1` is handed back to the
//! caller for disambiguation. The exact-key and full-name paths are not
//! deduplicated, so an object whose short and full names both match is
//! counted twice.

use crate::types::{ExitRecord, ItemRecord, PlayerRecord, RoomRecord};

/// Attribute predicates a candidate must satisfy to be included. `None`
/// means "don't care"; every supplied filter must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub is_getable: Option<bool>,
    pub is_container: Option<bool>,
    pub is_visible: Option<bool>,
    pub is_usable: Option<bool>,
    /// `true` requires `uses_left > 0`, `false` requires `uses_left == 0`.
    pub has_uses_left: Option<bool>,
    pub is_ingestable: Option<bool>,
    pub has_tag: Option<String>,
}

impl SearchFilters {
    pub fn getable(mut self, value: bool) -> Self {
        self.is_getable = Some(value);
        self
    }

    pub fn container(mut self, value: bool) -> Self {
        self.is_container = Some(value);
        self
    }

    pub fn visible(mut self, value: bool) -> Self {
        self.is_visible = Some(value);
        self
    }

    pub fn usable(mut self, value: bool) -> Self {
        self.is_usable = Some(value);
        self
    }

    pub fn uses_left(mut self, value: bool) -> Self {
        self.has_uses_left = Some(value);
        self
    }

    pub fn ingestable(mut self, value: bool) -> Self {
        self.is_ingestable = Some(value);
        self
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.has_tag = Some(tag.to_string());
        self
    }
}

/// Which collections to search, and whether the full-name path runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchScope {
    pub include_player: bool,
    pub include_room: bool,
    pub include_exits: bool,
    pub include_full_name: bool,
}

impl SearchScope {
    /// Inventory, room items, and exits; exact keys only.
    pub fn everywhere() -> Self {
        Self {
            include_player: true,
            include_room: true,
            include_exits: true,
            include_full_name: false,
        }
    }

    /// Player inventory only.
    pub fn inventory() -> Self {
        Self {
            include_player: true,
            include_room: false,
            include_exits: false,
            include_full_name: false,
        }
    }

    /// Room items only, no exits.
    pub fn room_items() -> Self {
        Self {
            include_player: false,
            include_room: true,
            include_exits: false,
            include_full_name: false,
        }
    }

    /// Inventory plus room items, no exits.
    pub fn carried_or_nearby() -> Self {
        Self {
            include_player: true,
            include_room: true,
            include_exits: false,
            include_full_name: false,
        }
    }

    /// Also run the linear full-name scan (recursing into containers).
    pub fn with_full_name(mut self) -> Self {
        self.include_full_name = true;
        self
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        Self::everywhere()
    }
}

/// Candidates partitioned by where they were found. Ephemeral: borrows the
/// player and room it was produced from, consumed immediately by the caller.
#[derive(Debug)]
pub struct SearchResult<'a> {
    pub player_items: Vec<&'a ItemRecord>,
    pub room_items: Vec<&'a ItemRecord>,
    pub room_exits: Vec<&'a ExitRecord>,
    /// Sum of the three partition sizes.
    pub found: usize,
}

impl<'a> SearchResult<'a> {
    fn new() -> Self {
        Self {
            player_items: Vec::new(),
            room_items: Vec::new(),
            room_exits: Vec::new(),
            found: 0,
        }
    }

    fn tally(&mut self) {
        self.found = self.player_items.len() + self.room_items.len() + self.room_exits.len();
    }

    pub fn is_ambiguous(&self) -> bool {
        self.found > 1
    }

    /// The single item candidate, if exactly one item matched.
    pub fn single_item(&self) -> Option<&'a ItemRecord> {
        match (self.player_items.as_slice(), self.room_items.as_slice()) {
            ([item], []) if self.found == 1 => Some(*item),
            ([], [item]) if self.found == 1 => Some(*item),
            _ => None,
        }
    }
}

/// Normalize a name for full-name comparison: lowercase, trimmed, inner
/// whitespace collapsed.
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn full_name_matches(spec: &str, item: &ItemRecord) -> bool {
    normalize_name(spec) == normalize_name(&item.full_name)
}

fn item_passes(item: &ItemRecord, filters: &SearchFilters) -> bool {
    if let Some(want) = filters.is_getable {
        if item.is_getable != want {
            return false;
        }
    }
    if let Some(want) = filters.is_container {
        if item.is_container != want {
            return false;
        }
    }
    if let Some(want) = filters.is_visible {
        if item.is_visible != want {
            return false;
        }
    }
    if let Some(want) = filters.is_usable {
        if item.is_usable != want {
            return false;
        }
    }
    if let Some(want) = filters.has_uses_left {
        if item.has_uses_left() != want {
            return false;
        }
    }
    if let Some(want) = filters.is_ingestable {
        if item.is_ingestable != want {
            return false;
        }
    }
    if let Some(tag) = &filters.has_tag {
        if !item.has_tag(tag) {
            return false;
        }
    }
    true
}

/// Exits carry no item attributes, so any supplied item-attribute filter
/// excludes the exit outright.
fn exit_passes(exit: &ExitRecord, filters: &SearchFilters) -> bool {
    if filters.is_getable.is_some()
        || filters.is_container.is_some()
        || filters.is_usable.is_some()
        || filters.has_uses_left.is_some()
        || filters.is_ingestable.is_some()
    {
        return false;
    }
    if let Some(want) = filters.is_visible {
        if exit.is_visible != want {
            return false;
        }
    }
    if let Some(tag) = &filters.has_tag {
        if !exit.has_tag(tag) {
            return false;
        }
    }
    true
}

fn candidate_item<'a>(
    item: &'a ItemRecord,
    player_id: &str,
    filters: &SearchFilters,
) -> Option<&'a ItemRecord> {
    if item.is_visible_to(player_id) && item_passes(item, filters) {
        Some(item)
    } else {
        None
    }
}

/// Collect full-name matches from a scope, recursing into container
/// contents so nested items are reachable.
fn scan_full_names<'a>(
    items: impl Iterator<Item = &'a ItemRecord>,
    spec: &str,
    player_id: &str,
    filters: &SearchFilters,
    out: &mut Vec<&'a ItemRecord>,
) {
    for item in items {
        if full_name_matches(spec, item) {
            if let Some(hit) = candidate_item(item, player_id, filters) {
                out.push(hit);
            }
        }
        if item.is_container {
            scan_full_names(item.contents.iter(), spec, player_id, filters, out);
        }
    }
}

/// Resolve `spec` for `player` across the enabled scopes.
///
/// Each enabled scope is searched by exact key first; when
/// `include_full_name` is set a linear full-name pass follows. Candidates
/// must pass every supplied filter, and hidden items/exits are dropped
/// unless the player is allowlisted. The caller receives all surviving
/// candidates; ties are never broken here.
pub fn search<'a>(
    player: &'a PlayerRecord,
    room: &'a RoomRecord,
    spec: &str,
    filters: &SearchFilters,
    scope: &SearchScope,
) -> SearchResult<'a> {
    let mut result = SearchResult::new();
    let spec = spec.trim();
    if spec.is_empty() {
        return result;
    }

    if scope.include_player {
        if let Some(item) = player.inventory.get(spec) {
            if let Some(hit) = candidate_item(item, &player.id, filters) {
                result.player_items.push(hit);
            }
        }
        if scope.include_full_name {
            scan_full_names(
                player.inventory.values(),
                spec,
                &player.id,
                filters,
                &mut result.player_items,
            );
        }
    }

    if scope.include_room {
        if let Some(item) = room.items.get(spec) {
            if let Some(hit) = candidate_item(item, &player.id, filters) {
                result.room_items.push(hit);
            }
        }
        if scope.include_full_name {
            scan_full_names(
                room.items.values(),
                spec,
                &player.id,
                filters,
                &mut result.room_items,
            );
        }
    }

    if scope.include_exits {
        if let Some(exit) = room.exits.get(spec) {
            if exit.is_visible_to(&player.id) && exit_passes(exit, filters) {
                result.room_exits.push(exit);
            }
        }
    }

    result.tally();
    result
}
