use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::message::{MessageView, PostMessageRequest},
    error::AppError,
    services::message_service,
    state::{CurrentUser, SharedState},
};

/// Game chat endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route(
        "/games/{id}/messages",
        get(list_messages).post(post_message),
    )
}

/// Chat history of a game, oldest first.
#[utoipa::path(
    get,
    path = "/games/{id}/messages",
    tag = "messages",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game messages", body = [MessageView]),
        (status = 403, description = "Caller is not registered for the game")
    )
)]
pub async fn list_messages(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    Ok(Json(message_service::list_messages(&state, &user, id).await?))
}

/// Post a message to a game's chat.
#[utoipa::path(
    post,
    path = "/games/{id}/messages",
    tag = "messages",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = MessageView),
        (status = 400, description = "Empty or oversized message"),
        (status = 403, description = "Caller is not registered for the game")
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    payload.validate()?;
    let message = message_service::post_message(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
