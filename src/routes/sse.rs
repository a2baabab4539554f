use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::sse::{GamesStreamQuery, StreamScope},
    error::AppError,
    services::{listing::ListingScope, sse_service},
    state::{CurrentUser, SharedState},
};

#[utoipa::path(
    get,
    path = "/sse/games",
    tag = "sse",
    params(GamesStreamQuery),
    responses(
        (status = 200, description = "Live games listing", content_type = "text/event-stream", body = String),
        (status = 401, description = "Sign-in required for the `mine` scope")
    )
)]
/// Stream the partitioned games listing, refreshed on every game change.
pub async fn games_stream(
    State(state): State<SharedState>,
    viewer: Option<CurrentUser>,
    Query(query): Query<GamesStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let scope = match query.scope {
        StreamScope::All => ListingScope::All,
        StreamScope::Mine => {
            let user = viewer
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("sign-in required".into()))?;
            ListingScope::Registered(user.id())
        }
    };
    info!(scope = ?query.scope, "new games SSE connection");
    Ok(sse_service::games_stream(state, viewer, scope))
}

#[utoipa::path(
    get,
    path = "/sse/games/{id}/messages",
    tag = "sse",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Live chat messages", content_type = "text/event-stream", body = String),
        (status = 403, description = "Caller is not registered for the game")
    )
)]
/// Stream new chat messages of a game to its registered players.
pub async fn messages_stream(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    info!(game_id = %id, user_id = %user.id(), "new messages SSE connection");
    Ok(sse_service::messages_stream(state, user, id).await?)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/games", get(games_stream))
        .route("/sse/games/{id}/messages", get(messages_stream))
}
