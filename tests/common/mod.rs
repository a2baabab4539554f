//! Shared helpers for the HTTP integration tests: an application backed by the
//! in-memory store and identity provider, plus request builders.

#![allow(dead_code)]

use std::sync::Arc;

use arena_back::{
    config::AppConfig,
    dao::{
        game_store::{ArenaStore, memory::MemoryStore},
        identity::{Identity, memory::MemoryIdentityProvider},
    },
    routes,
    state::{AppState, SharedState},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use serde_json::Value;
use uuid::Uuid;

/// Router plus the handles tests need to seed sessions.
pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub identity: MemoryIdentityProvider,
}

/// A signed-in player.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Application with a connected in-memory store.
    pub async fn new() -> Self {
        let app = Self::degraded();
        app.state
            .install_store(Arc::new(MemoryStore::new()) as Arc<dyn ArenaStore>)
            .await;
        app
    }

    /// Application without any store installed.
    pub fn degraded() -> Self {
        let identity = MemoryIdentityProvider::new();
        let state = AppState::new(AppConfig::default(), Arc::new(identity.clone()));
        let router = routes::router(state.clone());
        Self {
            router,
            state,
            identity,
        }
    }

    /// Register a new session and return its bearer token.
    pub fn sign_in(&self, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        let token = self.identity.issue(Identity {
            id,
            email: Some(format!("{}@example.com", name.to_lowercase())),
            display_name: Some(name.to_string()),
            avatar_url: None,
        });
        TestUser { id, token }
    }

    /// Send `request` through a fresh clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn get_request(uri: &str, user: Option<&TestUser>) -> Request<Body> {
    request(Method::GET, uri, user, Body::empty())
}

pub fn empty_request(method: Method, uri: &str, user: &TestUser) -> Request<Body> {
    request(method, uri, Some(user), Body::empty())
}

pub fn json_request(method: Method, uri: &str, user: &TestUser, body: Value) -> Request<Body> {
    let mut request = request(method, uri, Some(user), Body::from(body.to_string()));
    request.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    request
}

fn request(method: Method, uri: &str, user: Option<&TestUser>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
    }
    builder.body(body).expect("valid request")
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Payload for a valid upcoming game.
pub fn game_payload(title: &str, max_players: u32) -> Value {
    serde_json::json!({
        "title": title,
        "sport": "Basketball",
        "location": "Austin",
        "scheduled_at": "2030-03-01T17:00:00Z",
        "max_players": max_players,
        "description": "Bring water"
    })
}
