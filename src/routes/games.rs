use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{
        CreateGameRequest, GameDetails, GameListing, GameView, RegistrationOutcome,
        UpdateGameRequest,
    },
    error::AppError,
    services::{game_service, roster},
    state::{CurrentUser, SharedState},
};

/// Game listing, management and registration endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/games", get(list_games).post(create_game))
        .route("/my-games", get(my_games))
        .route(
            "/games/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
        .route("/games/{id}/cancel", post(cancel_game))
        .route("/games/{id}/registration", post(toggle_registration))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/leave", post(leave_game))
}

/// List every game split into upcoming and past.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses((status = 200, description = "Partitioned games listing", body = GameListing))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    viewer: Option<CurrentUser>,
) -> Result<Json<GameListing>, AppError> {
    Ok(Json(game_service::list_games(&state, viewer.as_ref()).await?))
}

/// List the games the caller is registered for.
#[utoipa::path(
    get,
    path = "/my-games",
    tag = "games",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's games", body = GameListing),
        (status = 401, description = "Sign-in required")
    )
)]
pub async fn my_games(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<GameListing>, AppError> {
    Ok(Json(game_service::my_games(&state, &user).await?))
}

/// Retrieve a game with its host and participants.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game details", body = GameDetails),
        (status = 404, description = "Game not found")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetails>, AppError> {
    Ok(Json(game_service::get_game(&state, viewer.as_ref(), id).await?))
}

/// Schedule a new game; the caller becomes its owner and first participant.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    security(("bearer" = [])),
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameView),
        (status = 400, description = "Invalid game definition")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameView>), AppError> {
    payload.validate()?;
    let game = game_service::create_game(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Edit an upcoming game (owner only).
#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated", body = GameView),
        (status = 403, description = "Caller is not the owner"),
        (status = 409, description = "Game is no longer editable")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<GameView>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::update_game(&state, &user, id, payload).await?))
}

/// Cancel an upcoming game (owner only).
#[utoipa::path(
    post,
    path = "/games/{id}/cancel",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game cancelled", body = GameView),
        (status = 403, description = "Caller is not the owner")
    )
)]
pub async fn cancel_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(game_service::cancel_game(&state, &user, id).await?))
}

/// Delete a game and its chat (owner only).
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 403, description = "Caller is not the owner")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join the game when not registered, leave it otherwise.
#[utoipa::path(
    post,
    path = "/games/{id}/registration",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Registration toggled", body = RegistrationOutcome),
        (status = 409, description = "Game full, closed or contended")
    )
)]
pub async fn toggle_registration(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationOutcome>, AppError> {
    Ok(Json(roster::toggle_registration(&state, &user, id).await?))
}

/// Register for a game.
#[utoipa::path(
    post,
    path = "/games/{id}/join",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Caller registered", body = RegistrationOutcome),
        (status = 409, description = "Game full, closed or contended")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationOutcome>, AppError> {
    Ok(Json(roster::join_game(&state, &user, id).await?))
}

/// Withdraw from a game.
#[utoipa::path(
    post,
    path = "/games/{id}/leave",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Caller unregistered", body = RegistrationOutcome))
)]
pub async fn leave_game(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationOutcome>, AppError> {
    Ok(Json(roster::leave_game(&state, &user, id).await?))
}
