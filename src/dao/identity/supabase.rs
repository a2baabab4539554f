use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

use super::{Identity, IdentityError, IdentityProvider};

const DEFAULT_OAUTH_PROVIDER: &str = "google";

/// Settings for the hosted auth endpoints.
#[derive(Debug, Clone)]
pub struct SupabaseAuthConfig {
    pub base_url: String,
    /// Public (anon) key sent alongside user tokens.
    pub anon_key: String,
    /// OAuth provider slug, e.g. `google`.
    pub provider: String,
}

impl SupabaseAuthConfig {
    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> Result<Self, IdentityError> {
        let base_url = std::env::var("SUPABASE_URL").map_err(|_| IdentityError::MissingEnvVar {
            var: "SUPABASE_URL",
        })?;
        let anon_key =
            std::env::var("SUPABASE_ANON_KEY").map_err(|_| IdentityError::MissingEnvVar {
                var: "SUPABASE_ANON_KEY",
            })?;
        let provider =
            std::env::var("OAUTH_PROVIDER").unwrap_or_else(|_| DEFAULT_OAUTH_PROVIDER.into());

        Ok(Self {
            base_url,
            anon_key,
            provider,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    picture: Option<String>,
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        let UserMetadata {
            full_name,
            name,
            avatar_url,
            picture,
        } = user.user_metadata;
        Self {
            id: user.id,
            email: user.email,
            display_name: full_name.or(name),
            avatar_url: avatar_url.or(picture),
        }
    }
}

/// [`IdentityProvider`] backed by Supabase GoTrue.
#[derive(Clone)]
pub struct SupabaseIdentityProvider {
    client: Client,
    base_url: Arc<str>,
    anon_key: Arc<str>,
    provider: Arc<str>,
}

impl SupabaseIdentityProvider {
    /// Prepare the HTTP client for the auth endpoints.
    pub fn new(config: SupabaseAuthConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .build()
            .map_err(|source| IdentityError::unavailable("failed to build auth client", source))?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            anon_key: Arc::<str>::from(config.anon_key),
            provider: Arc::<str>::from(config.provider),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

impl IdentityProvider for SupabaseIdentityProvider {
    fn authorize_url(&self, redirect_to: &str) -> Result<String, IdentityError> {
        let url = Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", self.provider.as_ref()),
                ("redirect_to", redirect_to),
            ],
        )
        .map_err(|source| IdentityError::unavailable("invalid auth endpoint", source))?;
        Ok(url.into())
    }

    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<Identity, IdentityError>> {
        let provider = self.clone();
        let token = token.to_owned();
        Box::pin(async move {
            let response = provider
                .client
                .get(provider.endpoint("user"))
                .header("apikey", provider.anon_key.as_ref())
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|source| IdentityError::unavailable("failed to reach auth server", source))?;

            match response.status() {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(IdentityError::InvalidSession)
                }
                status if status.is_success() => response
                    .json::<AuthUser>()
                    .await
                    .map(Identity::from)
                    .map_err(|source| IdentityError::unavailable("malformed user payload", source)),
                other => Err(IdentityError::Unavailable {
                    message: format!("unexpected auth status {other}"),
                    source: None,
                }),
            }
        })
    }

    fn sign_out(&self, token: &str) -> BoxFuture<'static, Result<(), IdentityError>> {
        let provider = self.clone();
        let token = token.to_owned();
        Box::pin(async move {
            let response = provider
                .client
                .post(provider.endpoint("logout"))
                .header("apikey", provider.anon_key.as_ref())
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|source| IdentityError::unavailable("failed to reach auth server", source))?;

            match response.status() {
                // An already revoked session counts as signed out.
                status if status.is_success() => Ok(()),
                StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
                other => Err(IdentityError::Unavailable {
                    message: format!("unexpected logout status {other}"),
                    source: None,
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_encodes_redirect_target() {
        let provider = SupabaseIdentityProvider::new(SupabaseAuthConfig {
            base_url: "https://demo.supabase.co/".into(),
            anon_key: "anon".into(),
            provider: "google".into(),
        })
        .unwrap();

        let url = provider
            .authorize_url("http://localhost:5173/games?tab=mine")
            .unwrap();
        assert_eq!(
            url,
            "https://demo.supabase.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Flocalhost%3A5173%2Fgames%3Ftab%3Dmine"
        );
    }

    #[test]
    fn metadata_fallbacks_fill_display_fields() {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": "6f1c2a8e-1b6e-4d8a-9d5c-6a1f2f0b9e11",
            "email": "sam@example.com",
            "user_metadata": { "name": "Sam", "picture": "https://img/sam.png" }
        }))
        .unwrap();

        let identity = Identity::from(user);
        assert_eq!(identity.display_name.as_deref(), Some("Sam"));
        assert_eq!(identity.avatar_url.as_deref(), Some("https://img/sam.png"));
    }
}
