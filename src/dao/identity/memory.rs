use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{Identity, IdentityError, IdentityProvider};

/// Token registry standing in for the hosted provider in development and tests.
#[derive(Clone, Default)]
pub struct MemoryIdentityProvider {
    sessions: Arc<DashMap<String, Identity>>,
}

impl MemoryIdentityProvider {
    /// Create a registry without any session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identity` under a freshly generated token.
    pub fn issue(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), identity);
        token
    }

    /// Register `identity` under a caller-chosen token (seeded development users).
    pub fn insert(&self, token: impl Into<String>, identity: Identity) {
        self.sessions.insert(token.into(), identity);
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn authorize_url(&self, _redirect_to: &str) -> Result<String, IdentityError> {
        Err(IdentityError::Unsupported(
            "no OAuth provider configured; use a development token".into(),
        ))
    }

    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<Identity, IdentityError>> {
        let found = self.sessions.get(token).map(|entry| entry.value().clone());
        Box::pin(async move { found.ok_or(IdentityError::InvalidSession) })
    }

    fn sign_out(&self, token: &str) -> BoxFuture<'static, Result<(), IdentityError>> {
        self.sessions.remove(token);
        Box::pin(async { Ok(()) })
    }
}
