//! Test double wrapping [`MemoryStore`] with injectable backend failures.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::future::BoxFuture;
use uuid::Uuid;

use super::{ArenaStore, memory::MemoryStore};
use crate::dao::{
    models::{GameEntity, MessageEntity, ProfileEntity},
    query::GameQuery,
    storage::{StorageError, StorageResult},
};

/// Answer given to health checks and reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ping {
    /// The API answered 2xx.
    Healthy,
    /// The API answered with a client error.
    Refused,
    /// Nothing answered.
    Unreachable,
}

impl Ping {
    fn outcome(self) -> StorageResult<()> {
        match self {
            Ping::Healthy => Ok(()),
            Ping::Refused => Err(StorageError::rejected("401 Unauthorized")),
            Ping::Unreachable => Err(StorageError::unavailable(
                "ping failed".into(),
                io::Error::from(io::ErrorKind::ConnectionReset),
            )),
        }
    }
}

/// [`MemoryStore`] with configurable ping answers and one write-refused game.
#[derive(Clone)]
pub struct FaultyStore {
    inner: MemoryStore,
    refused_update: Option<Uuid>,
    health: Ping,
    reconnect: Ping,
    reconnects: Arc<AtomicUsize>,
}

impl FaultyStore {
    /// Healthy wrapper around `inner`.
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            refused_update: None,
            health: Ping::Healthy,
            reconnect: Ping::Healthy,
            reconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every write to the game `id` as unavailable.
    pub fn failing_updates_of(mut self, id: Uuid) -> Self {
        self.refused_update = Some(id);
        self
    }

    /// Answers for `health_check` and `try_reconnect` respectively.
    pub fn with_pings(mut self, health: Ping, reconnect: Ping) -> Self {
        self.health = health;
        self.reconnect = reconnect;
        self
    }

    /// Number of `try_reconnect` calls seen so far.
    pub fn reconnect_attempts(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

impl ArenaStore for FaultyStore {
    fn list_games(&self, query: GameQuery) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        self.inner.list_games(query)
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.inner.find_game(id)
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        self.inner.insert_game(game)
    }

    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        if self.refused_update == Some(game.id) {
            return Box::pin(async {
                Err(StorageError::unavailable(
                    "write timed out".into(),
                    io::Error::from(io::ErrorKind::TimedOut),
                ))
            });
        }
        self.inner.update_game(game, expected_version)
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.inner.delete_game(id)
    }

    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        self.inner.find_profile(id)
    }

    fn find_profiles(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>> {
        self.inner.find_profiles(ids)
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<ProfileEntity>> {
        self.inner.save_profile(profile)
    }

    fn list_messages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        self.inner.list_messages(game_id)
    }

    fn insert_message(
        &self,
        message: MessageEntity,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>> {
        self.inner.insert_message(message)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let outcome = self.health.outcome();
        Box::pin(async move { outcome })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        let outcome = self.reconnect.outcome();
        Box::pin(async move { outcome })
    }
}
