use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod discover;
pub mod docs;
pub mod games;
pub mod health;
pub mod messages;
pub mod profiles;
pub mod sse;

/// Compose all route trees, wiring in session resolution, shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router())
        .merge(games::router())
        .merge(messages::router())
        .merge(profiles::router())
        .merge(discover::router())
        .merge(sse::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_session,
        ));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
