use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Arena Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::login,
        crate::routes::auth::session,
        crate::routes::auth::logout,
        crate::routes::games::list_games,
        crate::routes::games::my_games,
        crate::routes::games::get_game,
        crate::routes::games::create_game,
        crate::routes::games::update_game,
        crate::routes::games::cancel_game,
        crate::routes::games::delete_game,
        crate::routes::games::toggle_registration,
        crate::routes::games::join_game,
        crate::routes::games::leave_game,
        crate::routes::messages::list_messages,
        crate::routes::messages::post_message,
        crate::routes::profiles::my_profile,
        crate::routes::profiles::update_my_profile,
        crate::routes::profiles::get_profile,
        crate::routes::discover::discover,
        crate::routes::sse::games_stream,
        crate::routes::sse::messages_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::LoginResponse,
            crate::dto::auth::SessionResponse,
            crate::dto::game::GameView,
            crate::dto::game::GameListing,
            crate::dto::game::GameDetails,
            crate::dto::game::RegistrationAction,
            crate::dto::game::RegistrationOutcome,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::UpdateGameRequest,
            crate::dto::message::MessageView,
            crate::dto::message::PostMessageRequest,
            crate::dto::profile::ProfileView,
            crate::dto::profile::ProfileSummary,
            crate::dto::profile::UpdateProfileRequest,
            crate::dto::discover::DiscoverResponse,
            crate::dto::discover::MapView,
            crate::dto::discover::MapMarker,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::StreamScope,
            crate::dao::identity::Identity,
            crate::dao::models::GameStatus,
            crate::dao::models::SkillLevel,
            crate::dao::models::Coordinates,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "OAuth sign-in and sessions"),
        (name = "games", description = "Game scheduling and registration"),
        (name = "messages", description = "Per-game chat"),
        (name = "profiles", description = "Player profiles"),
        (name = "discover", description = "Map of upcoming games"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by authenticated operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/games",
            "/games/{id}",
            "/games/{id}/registration",
            "/games/{id}/messages",
            "/profiles/me",
            "/discover",
            "/sse/games",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|components| components.security_schemes.contains_key("bearer"))
        );
    }
}
