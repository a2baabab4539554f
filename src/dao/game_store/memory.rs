//! Process-local store used for development runs and tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::ArenaStore,
    models::{GameEntity, MessageEntity, ProfileEntity},
    query::GameQuery,
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    games: DashMap<Uuid, GameEntity>,
    profiles: DashMap<Uuid, ProfileEntity>,
    messages: DashMap<Uuid, Vec<MessageEntity>>,
}

/// [`ArenaStore`] backed by concurrent hash maps. Cloning shares the tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArenaStore for MemoryStore {
    fn list_games(&self, query: GameQuery) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut games = tables
                .games
                .iter()
                .filter(|entry| query.matches(entry.value()))
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            query.sort(&mut games);
            Ok(games)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.games.get(&id).map(|entry| entry.value().clone())) })
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables.games.insert(game.id, game.clone());
            Ok(game)
        })
    }

    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            // The shard write lock is held until `entry` drops, so the
            // compare and the replace are atomic.
            let Some(mut entry) = tables.games.get_mut(&game.id) else {
                return Ok(None);
            };
            if entry.version != expected_version {
                return Ok(None);
            }

            let mut next = game;
            next.version = expected_version + 1;
            *entry = next.clone();
            Ok(Some(next))
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let removed = tables.games.remove(&id).map(|(_, game)| game);
            tables.messages.remove(&id);
            Ok(removed)
        })
    }

    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.profiles.get(&id).map(|entry| entry.value().clone())) })
    }

    fn find_profiles(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            Ok(ids
                .iter()
                .filter_map(|id| tables.profiles.get(id).map(|entry| entry.value().clone()))
                .collect())
        })
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<ProfileEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables.profiles.insert(profile.id, profile.clone());
            Ok(profile)
        })
    }

    fn list_messages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut messages = tables
                .messages
                .get(&game_id)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(messages)
        })
    }

    fn insert_message(
        &self,
        message: MessageEntity,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables
                .messages
                .entry(message.game_id)
                .or_default()
                .push(message.clone());
            Ok(message)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
