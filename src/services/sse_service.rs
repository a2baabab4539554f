use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::ArenaStore,
        models::{GameEntity, MessageEntity},
    },
    dto::{
        game::GameListing,
        sse::{Handshake, ServerEvent, SystemStatus},
    },
    error::ServiceError,
    services::{
        listing::{GamesListing, ListingScope},
        message_service,
    },
    state::{ChangeEvent, ChangeFilter, ChangeKind, CurrentUser, SharedState, Subscription, Table},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_GAMES: &str = "games";
const EVENT_MESSAGE: &str = "message";
const EVENT_SYSTEM_STATUS: &str = "system_status";

type EventSender = mpsc::Sender<Result<Event, Infallible>>;

/// Live games listing: a snapshot on connect and after every change to the games table.
pub fn games_stream(
    state: SharedState,
    viewer: Option<CurrentUser>,
    scope: ListingScope,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let stream_name = match scope {
        ListingScope::All => "games",
        ListingScope::Registered(_) => "my-games",
    };

    tokio::spawn(async move {
        // Owned by this task so the refresh loop stops with the connection.
        let listing = GamesListing::open(state.clone(), scope);
        let mut snapshots = listing.watcher();
        let mut degraded = state.degraded_watcher();
        let viewer_id = viewer.as_ref().map(CurrentUser::id);

        let handshake = Handshake {
            stream: stream_name.into(),
            degraded: state.is_degraded(),
        };
        if !send_event(&tx, EVENT_HANDSHAKE, &handshake).await {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if let Some(partition) = snapshot {
                        let payload = GameListing::for_viewer(partition, viewer_id);
                        if !send_event(&tx, EVENT_GAMES, &payload).await {
                            break;
                        }
                    }
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let payload = SystemStatus { degraded: *degraded.borrow_and_update() };
                    if !send_event(&tx, EVENT_SYSTEM_STATUS, &payload).await {
                        break;
                    }
                }
            }
        }

        drop(listing);
        info!(stream = stream_name, "games SSE stream disconnected");
    });

    into_sse(rx)
}

/// Messages posted on a game, for its registered players.
///
/// The stream ends as soon as the caller leaves the roster or the game is deleted.
pub async fn messages_stream(
    state: SharedState,
    user: CurrentUser,
    game_id: Uuid,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    let store = state.require_store().await?;
    message_service::ensure_participant(store.as_ref(), &user, game_id).await?;

    let messages = state.feed().subscribe(
        Table::GameMessages,
        Some(ChangeFilter::eq("game_id", game_id)),
    );
    let games = state
        .feed()
        .subscribe(Table::Games, Some(ChangeFilter::eq("id", game_id)));
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        let handshake = Handshake {
            stream: "messages".into(),
            degraded: state.is_degraded(),
        };
        if !send_event(&tx, EVENT_HANDSHAKE, &handshake).await {
            return;
        }

        forward_messages(store, user.id(), game_id, messages, games, tx).await;
        info!(game_id = %game_id, user_id = %user.id(), "messages SSE stream disconnected");
    });

    Ok(into_sse(rx))
}

/// Relay chat inserts until the client leaves, the game drops `user_id` from its
/// roster, or the game is deleted.
async fn forward_messages(
    store: Arc<dyn ArenaStore>,
    user_id: Uuid,
    game_id: Uuid,
    mut messages: Subscription,
    mut games: Subscription,
    tx: EventSender,
) {
    loop {
        tokio::select! {
            // Game changes first: a leave published before a message must win.
            biased;
            _ = tx.closed() => break,
            event = games.recv() => {
                let Some(event) = event else { break };
                if revokes_access(&event, user_id) {
                    info!(game_id = %game_id, user_id = %user_id, "chat access revoked; closing stream");
                    break;
                }
            }
            event = messages.recv() => {
                let Some(event) = event else { break };
                let Some(message) = event.row::<MessageEntity>() else {
                    warn!(game_id = %game_id, "dropping undecodable message event");
                    continue;
                };
                let view = message_service::with_author(store.as_ref(), message).await;
                if !send_event(&tx, EVENT_MESSAGE, &view).await {
                    break;
                }
            }
        }
    }
}

/// Whether a games-table change means `user_id` may no longer read the chat.
fn revokes_access(event: &ChangeEvent, user_id: Uuid) -> bool {
    match event.event {
        ChangeKind::Delete => true,
        ChangeKind::Insert | ChangeKind::Update => event
            .row::<GameEntity>()
            .is_some_and(|game| !game.is_registered(user_id)),
    }
}

/// Serialize `payload` and push it to the client. Returns `false` once the client is gone.
async fn send_event<T: Serialize>(tx: &EventSender, name: &str, payload: &T) -> bool {
    let payload = match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialize SSE payload");
            return true;
        }
    };

    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    tx.send(Ok(event)).await.is_ok()
}

/// Response stream reading from the forwarder; axum drops it when the client disconnects.
fn into_sse(
    rx: mpsc::Receiver<Result<Event, Infallible>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
