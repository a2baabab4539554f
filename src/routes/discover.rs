use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use validator::Validate;

use crate::{
    dto::discover::{DiscoverQuery, DiscoverResponse},
    error::AppError,
    services::discover_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/discover",
    tag = "discover",
    params(DiscoverQuery),
    responses(
        (status = 200, description = "Map view and markers for upcoming games", body = DiscoverResponse),
        (status = 400, description = "Coordinates out of range")
    )
)]
/// Map view centred on the caller with one marker per upcoming game.
pub async fn discover(
    State(state): State<SharedState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoverResponse>, AppError> {
    query.validate()?;
    Ok(Json(discover_service::discover(&state, &query).await?))
}

/// Configure the discover map route.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/discover", get(discover))
}
