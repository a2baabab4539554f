#[cfg(test)]
pub mod faulty;
pub mod memory;
#[cfg(feature = "supabase-store")]
pub mod supabase;

use crate::dao::models::{GameEntity, MessageEntity, ProfileEntity};
use crate::dao::query::GameQuery;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the hosted relational store holding games, profiles and chat messages.
pub trait ArenaStore: Send + Sync {
    /// Select games matching the filters, ordered by scheduled date.
    fn list_games(&self, query: GameQuery) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Single game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Insert a new game row and return it as stored.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Conditional update: replaces the row only if its stored version equals
    /// `expected_version`, bumping the version. Returns `None` when the row is
    /// missing or was changed in the meantime.
    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Delete a game and its messages, returning the removed row.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Single profile by id.
    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>>;
    /// Profiles whose id is in `ids`; missing ids are skipped.
    fn find_profiles(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>>;
    /// Insert or fully replace a profile row.
    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<ProfileEntity>>;
    /// Messages of a game, oldest first.
    fn list_messages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>>;
    /// Append a chat message.
    fn insert_message(
        &self,
        message: MessageEntity,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>>;
    /// Cheap round-trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Try to reach the backend again after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
