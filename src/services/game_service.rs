use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::ArenaStore,
        models::{GameEntity, GameStatus, ProfileEntity},
    },
    dto::{
        game::{CreateGameRequest, GameDetails, GameListing, GameView, UpdateGameRequest},
        profile::ProfileSummary,
    },
    error::ServiceError,
    services::{
        change_events, lifecycle,
        listing::{self, ListingScope},
    },
    state::{CurrentUser, SharedState},
};

/// Attempts before a contended game write is reported as a conflict.
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Every game, partitioned and projected for the viewer.
pub async fn list_games(
    state: &SharedState,
    viewer: Option<&CurrentUser>,
) -> Result<GameListing, ServiceError> {
    let partition = listing::fetch(state, ListingScope::All).await?;
    Ok(GameListing::for_viewer(partition, viewer.map(CurrentUser::id)))
}

/// Games the caller is registered for.
pub async fn my_games(state: &SharedState, user: &CurrentUser) -> Result<GameListing, ServiceError> {
    let partition = listing::fetch(state, ListingScope::Registered(user.id())).await?;
    Ok(GameListing::for_viewer(partition, Some(user.id())))
}

/// A single game with its host and participant profiles.
pub async fn get_game(
    state: &SharedState,
    viewer: Option<&CurrentUser>,
    game_id: Uuid,
) -> Result<GameDetails, ServiceError> {
    let store = state.require_store().await?;
    let game = find_game(store.as_ref(), game_id).await?;
    let game = lifecycle::evaluate(&store, state.feed(), vec![game], state.now())
        .await
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;

    let mut ids = game.registered_players.clone();
    if !ids.contains(&game.creator_id) {
        ids.push(game.creator_id);
    }
    let profiles = profiles_by_id(store.as_ref(), ids).await?;
    let summary = |id: Uuid| {
        profiles
            .get(&id)
            .map(ProfileSummary::from)
            .unwrap_or_else(|| ProfileSummary::unknown(id))
    };

    Ok(GameDetails {
        host: summary(game.creator_id),
        participants: game.registered_players.iter().copied().map(summary).collect(),
        game: GameView::for_viewer(game, viewer.map(CurrentUser::id)),
    })
}

/// Schedule a new game owned, and joined, by the caller.
pub async fn create_game(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateGameRequest,
) -> Result<GameView, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();

    ensure_known_sport(state, &request.sport)?;
    ensure_future(request.scheduled_at, now)?;

    let game = GameEntity {
        id: Uuid::new_v4(),
        creator_id: user.id(),
        title: request.title.trim().to_string(),
        sport: request.sport,
        location: request.location.trim().to_string(),
        coordinates: request.coordinates,
        scheduled_at: request.scheduled_at,
        max_players: request.max_players,
        registered_players: vec![user.id()],
        description: normalize_description(request.description),
        status: GameStatus::Upcoming,
        created_at: now,
        version: 1,
    };

    let game = store.insert_game(game).await?;
    info!(game_id = %game.id, creator_id = %game.creator_id, sport = %game.sport, "game created");
    change_events::game_inserted(state.feed(), &game);
    Ok(GameView::for_viewer(game, Some(user.id())))
}

/// Owner edit of an upcoming game.
pub async fn update_game(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
    request: UpdateGameRequest,
) -> Result<GameView, ServiceError> {
    if let Some(sport) = &request.sport {
        ensure_known_sport(state, sport)?;
    }
    if let Some(scheduled_at) = request.scheduled_at {
        ensure_future(scheduled_at, state.now())?;
    }

    let now = state.now();
    let (game, _) = modify_game(state, game_id, |game| {
        ensure_owner(game, user)?;
        let status = game.effective_status(now);
        if status != GameStatus::Upcoming {
            return Err(ServiceError::InvalidState(format!(
                "a {} game can no longer be edited",
                status.as_str()
            )));
        }

        let mut next = game.clone();
        if let Some(max_players) = request.max_players {
            if (max_players as usize) < game.player_count() {
                return Err(ServiceError::InvalidInput(format!(
                    "max_players cannot drop below the {} registered players",
                    game.player_count()
                )));
            }
            next.max_players = max_players;
        }
        if let Some(title) = &request.title {
            next.title = title.trim().to_string();
        }
        if let Some(sport) = &request.sport {
            next.sport = sport.clone();
        }
        if let Some(location) = &request.location {
            next.location = location.trim().to_string();
            if next.location != game.location {
                // Stale pin; the city table or the new coordinates take over.
                next.coordinates = None;
            }
        }
        if request.coordinates.is_some() {
            next.coordinates = request.coordinates;
        }
        if let Some(scheduled_at) = request.scheduled_at {
            next.scheduled_at = scheduled_at;
        }
        if request.description.is_some() {
            next.description = normalize_description(request.description.clone());
        }

        Ok((next != *game).then_some(next))
    })
    .await?;

    info!(game_id = %game_id, "game updated");
    Ok(GameView::for_viewer(game, Some(user.id())))
}

/// Owner cancellation of an upcoming game.
pub async fn cancel_game(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<GameView, ServiceError> {
    let now = state.now();
    let (game, _) = modify_game(state, game_id, |game| {
        ensure_owner(game, user)?;
        let status = game.effective_status(now);
        if status != GameStatus::Upcoming {
            return Err(ServiceError::InvalidState(format!(
                "a {status} game cannot be cancelled",
                status = status.as_str()
            )));
        }
        let mut next = game.clone();
        next.status = GameStatus::Cancelled;
        Ok(Some(next))
    })
    .await?;

    info!(game_id = %game_id, "game cancelled");
    Ok(GameView::for_viewer(game, Some(user.id())))
}

/// Owner deletion; the game's messages go with it.
pub async fn delete_game(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let game = find_game(store.as_ref(), game_id).await?;
    ensure_owner(&game, user)?;

    let Some(removed) = store.delete_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    };
    info!(game_id = %game_id, "game deleted");
    change_events::game_deleted(state.feed(), &removed);
    Ok(())
}

/// Version-checked read-modify-write of a single game.
///
/// `change` sees the freshly read record and returns the replacement, or
/// `None` to leave it untouched. Lost races re-read and re-apply. Returns the
/// resulting record and whether a write happened.
pub(crate) async fn modify_game<F>(
    state: &SharedState,
    game_id: Uuid,
    mut change: F,
) -> Result<(GameEntity, bool), ServiceError>
where
    F: FnMut(&GameEntity) -> Result<Option<GameEntity>, ServiceError>,
{
    let store = state.require_store().await?;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let game = find_game(store.as_ref(), game_id).await?;
        let Some(next) = change(&game)? else {
            return Ok((game, false));
        };

        match store.update_game(next, game.version).await? {
            Some(updated) => {
                change_events::game_updated(state.feed(), &game, &updated);
                return Ok((updated, true));
            }
            None => debug!(game_id = %game_id, attempt, "game write lost a version race; retrying"),
        }
    }

    Err(ServiceError::Conflict(format!(
        "game `{game_id}` kept changing; please retry"
    )))
}

pub(crate) async fn find_game(store: &dyn ArenaStore, id: Uuid) -> Result<GameEntity, ServiceError> {
    store
        .find_game(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

pub(crate) async fn profiles_by_id(
    store: &dyn ArenaStore,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, ProfileEntity>, ServiceError> {
    Ok(store
        .find_profiles(ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect())
}

fn ensure_owner(game: &GameEntity, user: &CurrentUser) -> Result<(), ServiceError> {
    if game.is_owned_by(user.id()) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "only the creator can modify this game".into(),
        ))
    }
}

fn ensure_known_sport(state: &SharedState, sport: &str) -> Result<(), ServiceError> {
    if state.config().is_known_sport(sport) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!("unknown sport `{sport}`")))
    }
}

fn ensure_future(scheduled_at: OffsetDateTime, now: OffsetDateTime) -> Result<(), ServiceError> {
    if scheduled_at > now {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(
            "scheduled time must be in the future".into(),
        ))
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::MemoryStore,
            identity::{Identity, memory::MemoryIdentityProvider},
            models::Coordinates,
        },
        state::AppState,
    };

    fn user() -> CurrentUser {
        CurrentUser {
            identity: Identity {
                id: Uuid::new_v4(),
                email: None,
                display_name: Some("Priya".into()),
                avatar_url: None,
            },
            token: "test".into(),
        }
    }

    fn request(state: &SharedState) -> CreateGameRequest {
        CreateGameRequest {
            title: "  Five-a-side ".into(),
            sport: "Soccer".into(),
            location: "Pune".into(),
            coordinates: None,
            scheduled_at: state.now() + time::Duration::days(2),
            max_players: 10,
            description: Some("   ".into()),
        }
    }

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryIdentityProvider::new()));
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    #[tokio::test]
    async fn creator_is_the_first_participant() {
        let state = state().await;
        let host = user();
        let game = create_game(&state, &host, request(&state)).await.unwrap();

        assert_eq!(game.title, "Five-a-side");
        assert_eq!(game.registered_players, vec![host.id()]);
        assert_eq!(game.status, GameStatus::Upcoming);
        assert!(game.description.is_none());
        assert!(game.can_edit);
    }

    #[tokio::test]
    async fn unknown_sports_and_past_dates_are_rejected() {
        let state = state().await;
        let host = user();

        let mut unknown = request(&state);
        unknown.sport = "Quidditch".into();
        assert!(matches!(
            create_game(&state, &host, unknown).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut past = request(&state);
        past.scheduled_at = state.now() - time::Duration::hours(1);
        assert!(matches!(
            create_game(&state, &host, past).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn only_the_owner_may_edit_cancel_or_delete() {
        let state = state().await;
        let host = user();
        let stranger = user();
        let game = create_game(&state, &host, request(&state)).await.unwrap();

        let edit = UpdateGameRequest {
            title: Some("Hijacked".into()),
            ..UpdateGameRequest::default()
        };
        assert!(matches!(
            update_game(&state, &stranger, game.id, edit).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            cancel_game(&state, &stranger, game.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete_game(&state, &stranger, game.id).await,
            Err(ServiceError::Forbidden(_))
        ));

        let cancelled = cancel_game(&state, &host, game.id).await.unwrap();
        assert_eq!(cancelled.status, GameStatus::Cancelled);
        assert!(!cancelled.can_edit);

        delete_game(&state, &host, game.id).await.unwrap();
        assert!(matches!(
            get_game(&state, Some(&host), game.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn capacity_cannot_drop_below_the_roster() {
        let state = state().await;
        let host = user();
        let game = create_game(&state, &host, request(&state)).await.unwrap();
        crate::services::roster::join_game(&state, &user(), game.id)
            .await
            .unwrap();

        let shrink = UpdateGameRequest {
            max_players: Some(2),
            ..UpdateGameRequest::default()
        };
        let updated = update_game(&state, &host, game.id, shrink).await.unwrap();
        assert_eq!(updated.max_players, 2);
        assert_eq!(updated.registration, crate::dto::game::RegistrationAction::Unregister);

        let too_small = UpdateGameRequest {
            max_players: Some(1),
            ..UpdateGameRequest::default()
        };
        assert!(matches!(
            update_game(&state, &host, game.id, too_small).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn moving_a_game_drops_its_old_pin() {
        let state = state().await;
        let host = user();
        let pinned = Coordinates { lat: 18.52, lng: 73.85 };
        let mut create = request(&state);
        create.coordinates = Some(pinned);
        let game = create_game(&state, &host, create).await.unwrap();

        let same_place = UpdateGameRequest {
            location: Some(" Pune ".into()),
            ..UpdateGameRequest::default()
        };
        let unchanged = update_game(&state, &host, game.id, same_place).await.unwrap();
        assert_eq!(unchanged.coordinates, Some(pinned));

        let moved = UpdateGameRequest {
            location: Some("Mysore".into()),
            ..UpdateGameRequest::default()
        };
        let moved = update_game(&state, &host, game.id, moved).await.unwrap();
        assert_eq!(moved.location, "Mysore");
        assert_eq!(moved.coordinates, None);

        let repinned = Coordinates { lat: 12.29, lng: 76.64 };
        let relocated = UpdateGameRequest {
            location: Some("Bangalore".into()),
            coordinates: Some(repinned),
            ..UpdateGameRequest::default()
        };
        let relocated = update_game(&state, &host, game.id, relocated).await.unwrap();
        assert_eq!(relocated.coordinates, Some(repinned));
    }

    #[tokio::test]
    async fn past_games_awaiting_reclassification_are_frozen() {
        let state = state().await;
        let host = user();
        let game = create_game(&state, &host, request(&state)).await.unwrap();

        let store = state.require_store().await.unwrap();
        let mut stale = store.find_game(game.id).await.unwrap().unwrap();
        let version = stale.version;
        stale.scheduled_at = state.now() - time::Duration::days(1);
        store.update_game(stale, version).await.unwrap().unwrap();

        let edit = UpdateGameRequest {
            title: Some("Rematch".into()),
            ..UpdateGameRequest::default()
        };
        assert!(matches!(
            update_game(&state, &host, game.id, edit).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            cancel_game(&state, &host, game.id).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn details_fall_back_to_placeholder_profiles() {
        let state = state().await;
        let host = user();
        let game = create_game(&state, &host, request(&state)).await.unwrap();

        let details = get_game(&state, None, game.id).await.unwrap();
        assert_eq!(details.host, ProfileSummary::unknown(host.id()));
        assert_eq!(details.participants.len(), 1);
        assert!(!details.game.is_registered);
    }
}
