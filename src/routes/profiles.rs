use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile::{ProfileView, UpdateProfileRequest},
    error::AppError,
    services::profile_service,
    state::{CurrentUser, SharedState},
};

/// Profile endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/profiles/me", get(my_profile).put(update_my_profile))
        .route("/profiles/{id}", get(get_profile))
}

/// The caller's own profile, created on first access.
#[utoipa::path(
    get,
    path = "/profiles/me",
    tag = "profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller profile", body = ProfileView),
        (status = 401, description = "Sign-in required")
    )
)]
pub async fn my_profile(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(profile_service::my_profile(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/profiles/me",
    tag = "profiles",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileView),
        (status = 400, description = "Invalid profile fields")
    )
)]
/// Partially update the caller's profile.
pub async fn update_my_profile(
    State(state): State<SharedState>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, AppError> {
    payload.validate()?;
    Ok(Json(
        profile_service::update_my_profile(&state, &user, payload).await?,
    ))
}

/// Public profile of another player.
#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile identifier")),
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(profile_service::get_profile(&state, id).await?))
}
