use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::ArenaStore,
        models::{GameEntity, MessageEntity},
    },
    dto::{
        message::{MAX_MESSAGE_LENGTH, MessageView, PostMessageRequest},
        profile::ProfileSummary,
    },
    error::ServiceError,
    services::{change_events, game_service},
    state::{CurrentUser, SharedState},
};

/// Chat history of a game, oldest first. Participants only.
pub async fn list_messages(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<Vec<MessageView>, ServiceError> {
    let store = state.require_store().await?;
    ensure_participant(store.as_ref(), user, game_id).await?;

    let messages = store.list_messages(game_id).await?;
    let mut authors = messages.iter().map(|message| message.user_id).collect::<Vec<_>>();
    authors.sort_unstable();
    authors.dedup();
    let profiles = game_service::profiles_by_id(store.as_ref(), authors).await?;

    Ok(messages
        .into_iter()
        .map(|message| {
            let author = profiles
                .get(&message.user_id)
                .map(ProfileSummary::from)
                .unwrap_or_else(|| ProfileSummary::unknown(message.user_id));
            MessageView::new(message, author)
        })
        .collect())
}

/// Post a message on a game the caller is registered for.
pub async fn post_message(
    state: &SharedState,
    user: &CurrentUser,
    game_id: Uuid,
    request: PostMessageRequest,
) -> Result<MessageView, ServiceError> {
    let store = state.require_store().await?;
    let game = ensure_participant(store.as_ref(), user, game_id).await?;
    if !game.status.allows_chat() {
        return Err(ServiceError::InvalidState(format!(
            "chat is closed on a {} game",
            game.status.as_str()
        )));
    }

    let content = request.content.trim();
    if content.is_empty() {
        return Err(ServiceError::InvalidInput("message cannot be empty".into()));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "message exceeds {MAX_MESSAGE_LENGTH} characters"
        )));
    }

    let message = store
        .insert_message(MessageEntity {
            id: Uuid::new_v4(),
            game_id,
            user_id: user.id(),
            content: content.to_string(),
            created_at: state.now(),
        })
        .await?;
    info!(game_id = %game_id, user_id = %message.user_id, "chat message posted");
    change_events::message_inserted(state.feed(), &message);

    Ok(with_author(store.as_ref(), message).await)
}

/// Game the caller may chat on, or the reason they may not.
pub async fn ensure_participant(
    store: &dyn ArenaStore,
    user: &CurrentUser,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    let game = game_service::find_game(store, game_id).await?;
    if game.is_registered(user.id()) {
        Ok(game)
    } else {
        Err(ServiceError::Forbidden(
            "only registered players can access the game chat".into(),
        ))
    }
}

/// Attach the author's profile, falling back to a placeholder when it cannot be read.
pub async fn with_author(store: &dyn ArenaStore, message: MessageEntity) -> MessageView {
    let author = match store.find_profile(message.user_id).await {
        Ok(Some(profile)) => ProfileSummary::from(&profile),
        Ok(None) => ProfileSummary::unknown(message.user_id),
        Err(err) => {
            warn!(user_id = %message.user_id, error = %err, "failed to load message author");
            ProfileSummary::unknown(message.user_id)
        }
    };
    MessageView::new(message, author)
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
        },
        dto::game::CreateGameRequest,
        services::{game_service, roster},
        state::AppState,
    };

    fn user(name: &str) -> CurrentUser {
        CurrentUser {
            identity: Identity {
                id: Uuid::new_v4(),
                email: None,
                display_name: Some(name.into()),
                avatar_url: None,
            },
            token: name.into(),
        }
    }

    async fn game_with_host(state: &SharedState, host: &CurrentUser) -> Uuid {
        game_service::create_game(
            state,
            host,
            CreateGameRequest {
                title: "Morning rally".into(),
                sport: "Tennis".into(),
                location: "Mysore".into(),
                coordinates: None,
                scheduled_at: state.now() + time::Duration::days(1),
                max_players: 4,
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryIdentityProvider::new()));
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn text(content: &str) -> PostMessageRequest {
        PostMessageRequest {
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn outsiders_cannot_read_or_post() {
        let state = state().await;
        let host = user("host");
        let outsider = user("outsider");
        let game_id = game_with_host(&state, &host).await;

        assert!(matches!(
            post_message(&state, &outsider, game_id, text("hi")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            list_messages(&state, &outsider, game_id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn messages_are_trimmed_and_listed_in_order() {
        let state = state().await;
        let host = user("host");
        let guest = user("guest");
        let game_id = game_with_host(&state, &host).await;
        roster::join_game(&state, &guest, game_id).await.unwrap();

        post_message(&state, &host, game_id, text("  bring water  ")).await.unwrap();
        post_message(&state, &guest, game_id, text("on my way")).await.unwrap();
        assert!(matches!(
            post_message(&state, &guest, game_id, text("   ")).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let history = list_messages(&state, &guest, game_id).await.unwrap();
        let contents = history.iter().map(|m| m.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, ["bring water", "on my way"]);
        assert_eq!(history[0].author.id, host.id());
    }

    #[tokio::test]
    async fn messages_are_stamped_with_the_shared_clock() {
        let state = state().await;
        let host = user("host");
        let game_id = game_with_host(&state, &host).await;

        let before = state.now();
        let posted = post_message(&state, &host, game_id, text("court 3")).await.unwrap();
        assert!(posted.created_at >= before);
        assert!(posted.created_at <= state.now());
    }

    #[tokio::test]
    async fn cancelled_games_close_the_chat() {
        let state = state().await;
        let host = user("host");
        let game_id = game_with_host(&state, &host).await;
        game_service::cancel_game(&state, &host, game_id).await.unwrap();

        assert!(matches!(
            post_message(&state, &host, game_id, text("anyone?")).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
