use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::auth::{AccessTokenQuery, LoginQuery, LoginResponse, SessionResponse},
    error::AppError,
    services::auth_service,
    state::{CurrentUser, SharedState},
};

const BEARER_PREFIX: &str = "Bearer ";

/// Sign-in, session and sign-out endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/auth/login", get(login))
        .route("/auth/session", get(session))
        .route("/auth/logout", post(logout))
}

/// Start the OAuth flow.
#[utoipa::path(
    get,
    path = "/auth/login",
    tag = "auth",
    params(LoginQuery),
    responses(
        (status = 200, description = "Provider authorize URL", body = LoginResponse),
        (status = 409, description = "No OAuth provider configured")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<LoginResponse>, AppError> {
    query.validate()?;
    Ok(Json(auth_service::login_url(&state, &query.redirect_to)?))
}

/// Return the signed-in identity and profile.
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn session(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(auth_service::current_session(&state, &user).await?))
}

/// Invalidate the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses((status = 204, description = "Signed out"))
)]
pub async fn logout(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&state, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the session token, if any, into a [`CurrentUser`] request extension.
///
/// Requests without a token pass through anonymously; an invalid token is rejected.
pub async fn resolve_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = session_token(&req) else {
        return Ok(next.run(req).await);
    };

    let user = auth_service::resolve_session(&state, &token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Bearer header first, then the `access_token` query parameter.
fn session_token(req: &Request<Body>) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(|token| token.trim().to_owned());

    from_header
        .or_else(|| {
            Query::<AccessTokenQuery>::try_from_uri(req.uri())
                .ok()
                .and_then(|Query(query)| query.access_token)
        })
        .filter(|token| !token.is_empty())
}
