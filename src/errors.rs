use thiserror::Error;

/// Errors that can arise while querying or mutating the world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The spec matched zero candidates in the requested scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// The spec matched more than one candidate. Carries the partition
    /// counts so the caller can ask the player to disambiguate; no match is
    /// auto-selected.
    #[error("'{spec}' is ambiguous: {found} matches ({player_items} carried, {room_items} nearby, {room_exits} exits)")]
    Ambiguous {
        spec: String,
        found: usize,
        player_items: usize,
        room_items: usize,
        room_exits: usize,
    },

    /// The resolved object exists but fails a hard gate (not getable,
    /// exit locked, non-container used as a container).
    #[error("not permitted: {0}")]
    NotPermitted(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}
