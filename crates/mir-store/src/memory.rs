//! In-memory store used by tests and the demo binary.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Character, CharacterStore, ServerDirectory, ServerInfo, StoreError, User, UserDirectory};

/// A store that keeps everything in process memory.
///
/// Users and servers are fixed at build time. Characters are created at
/// runtime behind a lock, so the name check, the slot check and the insert
/// in [`CharacterStore::create`] happen atomically.
///
/// Cheap to clone: clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<HashMap<String, User>>,
    servers: Arc<Vec<ServerInfo>>,
    characters: Arc<RwLock<Vec<Character>>>,
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }
}

/// Builder for [`MemoryStore`].
#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    users: HashMap<String, User>,
    servers: Vec<ServerInfo>,
}

impl MemoryStoreBuilder {
    /// Adds an account. A second user with the same name replaces the first.
    pub fn user(mut self, user: User) -> Self {
        self.users.insert(user.username.clone(), user);
        self
    }

    /// Adds a server directory entry.
    pub fn server(mut self, server: ServerInfo) -> Self {
        self.servers.push(server);
        self
    }

    pub fn build(mut self) -> MemoryStore {
        self.servers.sort_by_key(|s| s.id);
        MemoryStore {
            users: Arc::new(self.users),
            servers: Arc::new(self.servers),
            characters: Arc::default(),
        }
    }
}

impl UserDirectory for MemoryStore {
    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(username).cloned())
    }
}

impl ServerDirectory for MemoryStore {
    async fn all(&self) -> Result<Vec<ServerInfo>, StoreError> {
        Ok(self.servers.as_ref().clone())
    }

    async fn find(&self, name: &str) -> Result<Option<ServerInfo>, StoreError> {
        Ok(self.servers.iter().find(|s| s.name == name).cloned())
    }
}

impl CharacterStore for MemoryStore {
    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Character>, StoreError> {
        let characters = self.characters.read().await;
        Ok(characters.iter().filter(|c| c.owner == owner).cloned().collect())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.characters.read().await.iter().any(|c| c.name == name))
    }

    async fn create(&self, character: Character, slot_limit: usize) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        if characters.iter().any(|c| c.name == character.name) {
            return Err(StoreError::NameTaken(character.name));
        }
        let owned = characters.iter().filter(|c| c.owner == character.owner).count();
        if owned >= slot_limit {
            return Err(StoreError::NoFreeSlot(character.owner));
        }
        tracing::debug!(owner = %character.owner, name = %character.name, "character stored");
        characters.push(character);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mir_protocol::{Gender, Job, ServerId};

    use super::*;

    const SLOTS: usize = 2;

    fn server(id: u32, name: &str) -> ServerInfo {
        ServerInfo {
            id: ServerId(id),
            name: name.into(),
            game_addr: "127.0.0.1".into(),
            game_port: 7400,
            login_addr: "127.0.0.1".into(),
            login_port: 7000,
        }
    }

    fn character(owner: &str, name: &str) -> Character {
        Character {
            owner: owner.into(),
            name: name.into(),
            job: Job::Taoist,
            hair: 3,
            gender: Gender::Female,
            level: 1,
        }
    }

    #[tokio::test]
    async fn test_find_user_known_and_unknown() {
        let store = MemoryStore::builder().user(User::new("pangliang", "pwd")).build();

        let user = UserDirectory::find(&store, "pangliang").await.unwrap();
        assert_eq!(user, Some(User::new("pangliang", "pwd")));
        assert_eq!(UserDirectory::find(&store, "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_all_servers_sorted_by_id() {
        let store = MemoryStore::builder()
            .server(server(2, "test2"))
            .server(server(1, "test1"))
            .build();

        let names: Vec<_> = store.all().await.unwrap().into_iter().map(|s| s.name).collect();

        assert_eq!(names, ["test1", "test2"]);
    }

    #[tokio::test]
    async fn test_find_server_by_name() {
        let store = MemoryStore::builder().server(server(1, "test1")).build();

        let found = ServerDirectory::find(&store, "test1").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(ServerId(1)));
        assert!(ServerDirectory::find(&store, "test9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_then_find_by_owner() {
        let store = MemoryStore::default();

        store.create(character("pangliang", "player1"), SLOTS).await.unwrap();
        store.create(character("other", "player2"), SLOTS).await.unwrap();

        let mine = store.find_by_owner("pangliang").await.unwrap();
        assert_eq!(mine, vec![character("pangliang", "player1")]);
        assert!(store.name_exists("player2").await.unwrap());
        assert!(!store.name_exists("player3").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_name_across_owners_is_rejected() {
        let store = MemoryStore::default();
        store.create(character("pangliang", "player1"), SLOTS).await.unwrap();

        let err = store.create(character("other", "player1"), SLOTS).await.unwrap_err();

        assert!(matches!(err, StoreError::NameTaken(ref n) if n == "player1"));
        assert!(store.find_by_owner("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_beyond_slot_limit_is_rejected() {
        let store = MemoryStore::default();
        store.create(character("pangliang", "player1"), SLOTS).await.unwrap();
        store.create(character("pangliang", "player2"), SLOTS).await.unwrap();

        let err = store.create(character("pangliang", "player3"), SLOTS).await.unwrap_err();

        assert!(matches!(err, StoreError::NoFreeSlot(ref o) if o == "pangliang"));
        assert!(!store.name_exists("player3").await.unwrap());
        // Other owners are unaffected.
        store.create(character("other", "player3"), SLOTS).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_name_conflict_reported_before_full_slots() {
        let store = MemoryStore::default();
        store.create(character("pangliang", "player1"), 1).await.unwrap();

        let err = store.create(character("pangliang", "player1"), 1).await.unwrap_err();

        assert!(matches!(err, StoreError::NameTaken(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_respect_slot_limit() {
        let store = MemoryStore::default();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create(character("pangliang", &format!("player{i}")), SLOTS).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, SLOTS);
        assert_eq!(store.find_by_owner("pangliang").await.unwrap().len(), SLOTS);
    }

    #[tokio::test]
    async fn test_clones_share_characters() {
        let store = MemoryStore::default();
        let clone = store.clone();

        clone.create(character("pangliang", "player1"), SLOTS).await.unwrap();

        assert!(store.name_exists("player1").await.unwrap());
    }
}
