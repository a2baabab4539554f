//! Boundary with the hosted identity provider: OAuth sign-in URL, session
//! resolution and sign-out.

pub mod memory;
#[cfg(feature = "supabase-store")]
pub mod supabase;

use std::error::Error;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Identifier shared with the `profiles` table.
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Failures raised while talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The request carried no session token.
    #[error("missing session token")]
    MissingSession,
    /// The token is unknown, revoked or expired.
    #[error("invalid or expired session")]
    InvalidSession,
    /// The provider cannot start an interactive sign-in.
    #[error("sign-in unavailable: {0}")]
    Unsupported(String),
    /// Required environment variable is missing.
    #[error("missing identity provider environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The provider could not be reached or answered unexpectedly.
    #[error("identity provider unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
}

impl IdentityError {
    /// Wrap a transport or decoding failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        IdentityError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Session authority used by the authentication middleware and routes.
pub trait IdentityProvider: Send + Sync {
    /// URL the browser must visit to start the OAuth flow, returning to `redirect_to`.
    fn authorize_url(&self, redirect_to: &str) -> Result<String, IdentityError>;
    /// Resolve a bearer session token into the signed-in identity.
    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<Identity, IdentityError>>;
    /// Invalidate the session behind `token`.
    fn sign_out(&self, token: &str) -> BoxFuture<'static, Result<(), IdentityError>>;
}
