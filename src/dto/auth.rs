use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{dao::identity::Identity, dto::profile::ProfileView};

/// Where the provider should send the browser back after sign-in.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    #[validate(url)]
    pub redirect_to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Provider URL the browser must visit.
    pub authorize_url: String,
}

/// Signed-in identity and its profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub identity: Identity,
    pub profile: ProfileView,
}

/// Session token passed in the query string, for clients that cannot set headers.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccessTokenQuery {
    pub access_token: Option<String>,
}
