use tracing::{debug, info};

use crate::{
    dto::auth::{LoginResponse, SessionResponse},
    error::ServiceError,
    services::profile_service,
    state::{CurrentUser, SharedState},
};

/// Provider URL starting the OAuth flow, returning the browser to `redirect_to`.
pub fn login_url(state: &SharedState, redirect_to: &str) -> Result<LoginResponse, ServiceError> {
    let authorize_url = state.identity().authorize_url(redirect_to)?;
    Ok(LoginResponse { authorize_url })
}

/// Resolve a bearer token into the signed-in caller.
pub async fn resolve_session(state: &SharedState, token: &str) -> Result<CurrentUser, ServiceError> {
    let identity = state.identity().resolve(token).await?;
    debug!(user_id = %identity.id, "session resolved");
    Ok(CurrentUser {
        identity,
        token: token.to_string(),
    })
}

/// Identity and profile of the caller, creating the profile on first sign-in.
pub async fn current_session(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<SessionResponse, ServiceError> {
    let profile = profile_service::ensure_profile(state, &user.identity).await?;
    Ok(SessionResponse {
        identity: user.identity.clone(),
        profile: profile.into(),
    })
}

/// Invalidate the caller's session at the provider.
pub async fn logout(state: &SharedState, user: &CurrentUser) -> Result<(), ServiceError> {
    state.identity().sign_out(&user.token).await?;
    info!(user_id = %user.id(), "signed out");
    Ok(())
}
