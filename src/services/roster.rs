//! Roster mutations: pure join/leave/toggle rules plus the version-checked
//! read-modify-write loop that applies them to the store.

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameStatus},
    dto::game::{GameView, RegistrationOutcome},
    error::ServiceError,
    services::game_service,
    state::{CurrentUser, SharedState},
};

/// Rejection raised by the pure roster rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("game is full")]
    Full,
}

/// Add `user` to `roster`. Joining twice is a no-op.
pub fn join(roster: &[Uuid], max_players: u32, user: Uuid) -> Result<Vec<Uuid>, RosterError> {
    if roster.contains(&user) {
        return Ok(roster.to_vec());
    }
    if roster.len() >= max_players as usize {
        return Err(RosterError::Full);
    }
    let mut next = roster.to_vec();
    next.push(user);
    Ok(next)
}

/// Remove `user` from `roster`. Leaving without being registered is a no-op.
pub fn leave(roster: &[Uuid], user: Uuid) -> Vec<Uuid> {
    roster.iter().copied().filter(|member| *member != user).collect()
}

/// Leave when registered, join otherwise. Returns the new roster and whether
/// `user` is on it.
pub fn toggle(
    roster: &[Uuid],
    max_players: u32,
    user: Uuid,
) -> Result<(Vec<Uuid>, bool), RosterError> {
    if roster.contains(&user) {
        Ok((leave(roster, user), false))
    } else {
        join(roster, max_players, user).map(|next| (next, true))
    }
}

#[derive(Debug, Clone, Copy)]
enum Intent {
    Join,
    Leave,
    Toggle,
}

/// Flip the caller's registration on a game.
pub async fn toggle_registration(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<RegistrationOutcome, ServiceError> {
    mutate(state, user, game_id, Intent::Toggle).await
}

/// Put the caller on a game's roster.
pub async fn join_game(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<RegistrationOutcome, ServiceError> {
    mutate(state, user, game_id, Intent::Join).await
}

/// Take the caller off a game's roster.
pub async fn leave_game(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<RegistrationOutcome, ServiceError> {
    mutate(state, user, game_id, Intent::Leave).await
}

/// New roster for `game`, or `None` when the intent leaves it unchanged.
fn apply(
    game: &GameEntity,
    user: Uuid,
    intent: Intent,
    now: OffsetDateTime,
) -> Result<Option<Vec<Uuid>>, ServiceError> {
    let registered = game.is_registered(user);
    let joining = match intent {
        Intent::Join if registered => return Ok(None),
        Intent::Leave if !registered => return Ok(None),
        Intent::Join => true,
        Intent::Leave => false,
        Intent::Toggle => !registered,
    };

    let status = game.effective_status(now);
    if joining && status != GameStatus::Upcoming {
        return Err(ServiceError::InvalidState(format!(
            "registration is closed for a {} game",
            status.as_str()
        )));
    }

    let roster = &game.registered_players;
    let next = match intent {
        Intent::Join => join(roster, game.max_players, user)?,
        Intent::Leave => leave(roster, user),
        Intent::Toggle => toggle(roster, game.max_players, user)?.0,
    };
    Ok(Some(next))
}

async fn mutate(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
    intent: Intent,
) -> Result<RegistrationOutcome, ServiceError> {
    let user_id = user.id();
    let now = state.now();
    let (game, changed) = game_service::modify_game(state, game_id, |game| {
        Ok(apply(game, user_id, intent, now)?.map(|roster| GameEntity {
            registered_players: roster,
            ..game.clone()
        }))
    })
    .await?;

    if changed {
        info!(
            game_id = %game_id,
            user_id = %user_id,
            players = game.player_count(),
            "roster updated"
        );
    }
    Ok(outcome(game, user_id))
}

fn outcome(game: GameEntity, user: Uuid) -> RegistrationOutcome {
    RegistrationOutcome {
        registered: game.is_registered(user),
        game: GameView::for_viewer(game, Some(user)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{ArenaStore, memory::MemoryStore},
            identity::{Identity, memory::MemoryIdentityProvider},
        },
        state::AppState,
    };

    fn user(id: Uuid) -> CurrentUser {
        CurrentUser {
            identity: Identity {
                id,
                email: None,
                display_name: None,
                avatar_url: None,
            },
            token: "test".into(),
        }
    }

    fn game(max_players: u32, roster: Vec<Uuid>) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            creator_id: roster.first().copied().unwrap_or_else(Uuid::new_v4),
            title: "Doubles".into(),
            sport: "Badminton".into(),
            location: "Bangalore".into(),
            coordinates: None,
            scheduled_at: datetime!(2030-01-01 10:00 UTC),
            max_players,
            registered_players: roster,
            description: None,
            status: GameStatus::Upcoming,
            created_at: datetime!(2026-01-01 00:00 UTC),
            version: 1,
        }
    }

    #[test]
    fn join_then_leave_restores_the_roster() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let roster = vec![a];
        let joined = join(&roster, 4, b).unwrap();
        assert_eq!(joined, vec![a, b]);
        assert_eq!(leave(&joined, b), roster);
    }

    #[test]
    fn join_respects_capacity_and_is_idempotent() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(join(&[a], 2, a).unwrap(), vec![a]);
        let full = join(&[a], 2, b).unwrap();
        assert_eq!(join(&full, 2, c), Err(RosterError::Full));
        assert_eq!(join(&full, 2, b).unwrap(), full);
    }

    #[test]
    fn toggle_reports_resulting_membership() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (roster, registered) = toggle(&[a], 3, b).unwrap();
        assert!(registered);
        let (roster, registered) = toggle(&roster, 3, b).unwrap();
        assert!(!registered);
        assert_eq!(roster, vec![a]);
        assert_eq!(leave(&roster, b), vec![a]);
    }

    async fn setup(game: GameEntity) -> (SharedState, MemoryStore, Uuid) {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryIdentityProvider::new()));
        let store = MemoryStore::new();
        let id = store.insert_game(game).await.unwrap().id;
        state.install_store(Arc::new(store.clone())).await;
        (state, store, id)
    }

    #[tokio::test]
    async fn second_player_fills_a_two_player_game() {
        let host = Uuid::new_v4();
        let (state, store, id) = setup(game(2, vec![host])).await;
        let guest = Uuid::new_v4();

        let outcome = toggle_registration(&state, &user(guest), id).await.unwrap();
        assert!(outcome.registered);
        assert_eq!(outcome.game.player_count, 2);

        let late = toggle_registration(&state, &user(Uuid::new_v4()), id).await;
        assert!(matches!(late, Err(ServiceError::GameFull)));
        let stored = store.find_game(id).await.unwrap().unwrap();
        assert_eq!(stored.registered_players, vec![host, guest]);
    }

    #[tokio::test]
    async fn concurrent_joins_never_overbook() {
        let host = Uuid::new_v4();
        let (state, store, id) = setup(game(3, vec![host])).await;

        let joins = (0..8).map(|_| {
            let state = state.clone();
            tokio::spawn(async move { join_game(&state, &user(Uuid::new_v4()), id).await })
        });
        let results = futures::future::join_all(joins).await;
        let accepted = results
            .into_iter()
            .filter(|result| matches!(result, Ok(Ok(_))))
            .count();

        let stored = store.find_game(id).await.unwrap().unwrap();
        assert_eq!(stored.player_count(), 3);
        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    async fn completed_games_refuse_joins_but_allow_leaving() {
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let mut finished = game(4, vec![host, guest]);
        finished.status = GameStatus::Completed;
        let (state, _store, id) = setup(finished).await;

        let join = join_game(&state, &user(Uuid::new_v4()), id).await;
        assert!(matches!(join, Err(ServiceError::InvalidState(_))));

        let left = leave_game(&state, &user(guest), id).await.unwrap();
        assert!(!left.registered);
        assert_eq!(left.game.player_count, 1);
    }

    #[tokio::test]
    async fn past_game_not_yet_reclassified_refuses_joins() {
        let host = Uuid::new_v4();
        let mut stale = game(6, vec![host]);
        stale.scheduled_at = datetime!(2020-01-01 10:00 UTC);
        let (state, store, id) = setup(stale).await;

        let join = join_game(&state, &user(Uuid::new_v4()), id).await;
        assert!(matches!(join, Err(ServiceError::InvalidState(_))));
        let toggle = toggle_registration(&state, &user(Uuid::new_v4()), id).await;
        assert!(matches!(toggle, Err(ServiceError::InvalidState(_))));

        let stored = store.find_game(id).await.unwrap().unwrap();
        assert_eq!(stored.registered_players, vec![host]);
        assert_eq!(stored.version, 1);
    }
}
