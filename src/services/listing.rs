//! Upcoming/past partition of the games table and the live listing view.

use std::cmp::Reverse;

use time::OffsetDateTime;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{models::GameEntity, query::GameQuery},
    error::ServiceError,
    services::lifecycle,
    state::{SharedState, Table},
};

/// Games split around a reference instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Scheduled at or after the reference instant, soonest first.
    pub upcoming: Vec<GameEntity>,
    /// Scheduled before the reference instant, most recent first.
    pub past: Vec<GameEntity>,
}

/// Split `games` into upcoming (`scheduled_at >= now`, ascending) and past
/// (`scheduled_at < now`, descending). Status plays no part.
pub fn partition(games: Vec<GameEntity>, now: OffsetDateTime) -> Partition {
    let (mut past, mut upcoming): (Vec<_>, Vec<_>) =
        games.into_iter().partition(|game| game.is_past(now));
    upcoming.sort_by_key(|game| game.scheduled_at);
    past.sort_by_key(|game| Reverse(game.scheduled_at));
    Partition { upcoming, past }
}

/// Which games a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Every game.
    All,
    /// Games whose roster contains the user.
    Registered(Uuid),
}

impl ListingScope {
    fn query(self) -> GameQuery {
        match self {
            ListingScope::All => GameQuery::all(),
            ListingScope::Registered(user) => GameQuery::registered(user),
        }
    }
}

/// Select, reclassify and partition the games in `scope`.
pub async fn fetch(state: &SharedState, scope: ListingScope) -> Result<Partition, ServiceError> {
    let store = state.require_store().await?;
    let games = store.list_games(scope.query()).await?;
    let now = state.now();
    let games = lifecycle::evaluate(&store, state.feed(), games, now).await;
    Ok(partition(games, now))
}

/// Listing kept current by the change feed: every `games` event triggers a
/// full refetch. Dropping the view stops the refresh task and closes its
/// subscription.
pub struct GamesListing {
    snapshot: watch::Receiver<Option<Partition>>,
    task: JoinHandle<()>,
}

impl GamesListing {
    /// Subscribe to the games table, then load the first snapshot in the background.
    pub fn open(state: SharedState, scope: ListingScope) -> Self {
        // Subscribing before the first fetch so no change slips in between.
        let mut subscription = state.feed().subscribe(Table::Games, None);
        let (tx, snapshot) = watch::channel(None);

        let task = tokio::spawn(async move {
            loop {
                match fetch(&state, scope).await {
                    Ok(partition) => {
                        if tx.send(Some(partition)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(?scope, error = %err, "failed to refresh games listing"),
                }

                let Some(event) = subscription.recv().await else {
                    break;
                };
                debug!(?scope, kind = ?event.event, "games changed; refreshing listing");
            }
        });

        Self { snapshot, task }
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn watcher(&self) -> watch::Receiver<Option<Partition>> {
        self.snapshot.clone()
    }

    /// Latest published snapshot, if the first fetch completed.
    pub fn current(&self) -> Option<Partition> {
        self.snapshot.borrow().clone()
    }
}

impl Drop for GamesListing {
    fn drop(&mut self) {
        self.task.abort();
    }
}
