//! Reclassifies games whose scheduled time has passed.
//!
//! Runs once per fetch, never on a timer. Each due game gets its own
//! conditional write; a failed or lost write leaves the record untouched and
//! it is picked up again by the next fetch.

use std::sync::Arc;

use futures::future::join_all;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::ArenaStore,
        models::{GameEntity, GameStatus},
    },
    services::change_events,
    state::ChangeFeed,
};

/// Ids of the games still `upcoming` although scheduled strictly before `now`.
pub fn due_for_completion(games: &[GameEntity], now: OffsetDateTime) -> Vec<Uuid> {
    games
        .iter()
        .filter(|game| game.status == GameStatus::Upcoming && game.is_past(now))
        .map(|game| game.id)
        .collect()
}

/// Mark every due game as completed and return the snapshot with the
/// successful writes applied.
pub async fn evaluate(
    store: &Arc<dyn ArenaStore>,
    feed: &ChangeFeed,
    mut games: Vec<GameEntity>,
    now: OffsetDateTime,
) -> Vec<GameEntity> {
    let due = due_for_completion(&games, now);
    if due.is_empty() {
        return games;
    }

    let writes = games
        .iter()
        .filter(|game| due.contains(&game.id))
        .map(|game| {
            let mut completed = game.clone();
            completed.status = GameStatus::Completed;
            let previous = game.clone();
            let write = store.update_game(completed, game.version);
            async move { (previous, write.await) }
        });

    for (previous, outcome) in join_all(writes).await {
        match outcome {
            Ok(Some(updated)) => {
                change_events::game_updated(feed, &previous, &updated);
                if let Some(slot) = games.iter_mut().find(|game| game.id == updated.id) {
                    *slot = updated;
                }
            }
            Ok(None) => {
                debug!(game_id = %previous.id, "game changed concurrently; skipping completion");
            }
            Err(err) => {
                warn!(game_id = %previous.id, error = %err, "failed to mark game as completed");
            }
        }
    }

    games
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::dao::{
        game_store::{faulty::FaultyStore, memory::MemoryStore},
        query::GameQuery,
    };

    fn game_at(scheduled_at: OffsetDateTime, status: GameStatus) -> GameEntity {
        let creator = Uuid::new_v4();
        GameEntity {
            id: Uuid::new_v4(),
            creator_id: creator,
            title: "Evening volleyball".into(),
            sport: "Volleyball".into(),
            location: "Mumbai".into(),
            coordinates: None,
            scheduled_at,
            max_players: 12,
            registered_players: vec![creator],
            description: None,
            status,
            created_at: datetime!(2026-01-01 00:00 UTC),
            version: 1,
        }
    }

    #[test]
    fn only_past_upcoming_games_are_due() {
        let now = datetime!(2026-06-01 12:00 UTC);
        let past = game_at(datetime!(2026-06-01 11:59 UTC), GameStatus::Upcoming);
        let exactly_now = game_at(now, GameStatus::Upcoming);
        let cancelled = game_at(datetime!(2026-05-01 10:00 UTC), GameStatus::Cancelled);
        let future = game_at(datetime!(2026-06-02 10:00 UTC), GameStatus::Upcoming);

        let due = due_for_completion(&[past.clone(), exactly_now, cancelled, future], now);
        assert_eq!(due, vec![past.id]);
    }

    #[tokio::test]
    async fn evaluation_is_idempotent() {
        let memory = MemoryStore::new();
        let store: Arc<dyn ArenaStore> = Arc::new(memory);
        let feed = ChangeFeed::new(8);
        let now = datetime!(2026-06-01 12:00 UTC);
        let stale = store
            .insert_game(game_at(datetime!(2026-05-30 18:00 UTC), GameStatus::Upcoming))
            .await
            .unwrap();

        let first = evaluate(&store, &feed, vec![stale.clone()], now).await;
        assert_eq!(first[0].status, GameStatus::Completed);

        let refetched = store.list_games(GameQuery::all()).await.unwrap();
        let second = evaluate(&store, &feed, refetched, now).await;
        assert_eq!(second, first);
        assert!(due_for_completion(&second, now).is_empty());
    }

    #[tokio::test]
    async fn lost_race_keeps_the_fetched_status() {
        let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
        let feed = ChangeFeed::new(8);
        let now = datetime!(2026-06-01 12:00 UTC);
        let stored = store
            .insert_game(game_at(datetime!(2026-05-30 18:00 UTC), GameStatus::Upcoming))
            .await
            .unwrap();

        // Someone else updated the row after our fetch.
        let mut stale_copy = stored.clone();
        stale_copy.version = 0;

        let snapshot = evaluate(&store, &feed, vec![stale_copy], now).await;
        assert_eq!(snapshot[0].status, GameStatus::Upcoming);
    }

    #[tokio::test]
    async fn failed_sibling_write_leaves_only_that_game_upcoming() {
        let inner = MemoryStore::new();
        let now = datetime!(2026-06-01 12:00 UTC);
        let broken = inner
            .insert_game(game_at(datetime!(2026-05-28 18:00 UTC), GameStatus::Upcoming))
            .await
            .unwrap();
        let healthy = inner
            .insert_game(game_at(datetime!(2026-05-29 18:00 UTC), GameStatus::Upcoming))
            .await
            .unwrap();
        let store: Arc<dyn ArenaStore> =
            Arc::new(FaultyStore::new(inner.clone()).failing_updates_of(broken.id));
        let feed = ChangeFeed::new(8);
        let mut updates = feed.subscribe(crate::state::Table::Games, None);

        let snapshot = evaluate(&store, &feed, vec![broken.clone(), healthy.clone()], now).await;

        let status_of = |id: Uuid| snapshot.iter().find(|game| game.id == id).unwrap().status;
        assert_eq!(status_of(broken.id), GameStatus::Upcoming);
        assert_eq!(status_of(healthy.id), GameStatus::Completed);

        let stored = inner.find_game(broken.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GameStatus::Upcoming);
        let event = updates.recv().await.unwrap();
        assert_eq!(event.row::<GameEntity>().unwrap().id, healthy.id);
    }
}
