//! Error types for the storage layer.

/// Errors reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A character with this name already exists, for any owner.
    #[error("character name already taken: {0}")]
    NameTaken(String),

    /// The owner already holds the maximum number of characters.
    #[error("no free character slot for {0}")]
    NoFreeSlot(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
