//! Storage interfaces the Mir servers depend on.
//!
//! The servers never own persistence. They talk to three narrow traits:
//!
//! - [`UserDirectory`]: accounts, for the password check
//! - [`ServerDirectory`]: the list of game servers
//! - [`CharacterStore`]: character records, for the roster
//!
//! Implement them over a database in production. [`MemoryStore`]
//! implements all three for tests and local runs.
//!
//! `UserDirectory` and `ServerDirectory` both name their lookup `find`. When
//! a type implements both, call them as `UserDirectory::find(&store, ..)`.

mod error;
mod memory;
mod types;

pub use error::StoreError;
pub use memory::{MemoryStore, MemoryStoreBuilder};
pub use types::{Character, ServerInfo, User};

use std::future::Future;

/// Looks up accounts by username.
pub trait UserDirectory: Send + Sync + 'static {
    /// Returns the account, or `None` if the username is unknown.
    fn find(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
}

/// Lists and looks up game servers.
pub trait ServerDirectory: Send + Sync + 'static {
    /// Every configured server, in ascending id order.
    fn all(&self) -> impl Future<Output = Result<Vec<ServerInfo>, StoreError>> + Send;

    /// The server with this display name, if any.
    fn find(&self, name: &str)
    -> impl Future<Output = Result<Option<ServerInfo>, StoreError>> + Send;
}

/// Reads and creates character records.
pub trait CharacterStore: Send + Sync + 'static {
    /// Every character owned by `owner`, in creation order.
    fn find_by_owner(
        &self,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<Character>, StoreError>> + Send;

    /// Whether any owner has a character called `name`.
    fn name_exists(&self, name: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Stores a new character if its owner holds fewer than `slot_limit`.
    ///
    /// Both checks and the insert must be atomic with respect to other
    /// `create` calls, whatever earlier reads reported.
    ///
    /// # Errors
    /// - [`StoreError::NameTaken`]: the name is used by any owner
    /// - [`StoreError::NoFreeSlot`]: the owner already holds `slot_limit`
    fn create(
        &self,
        character: Character,
        slot_limit: usize,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
