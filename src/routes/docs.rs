use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the raw OpenAPI document is served.
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

/// Serve the Swagger UI at `/docs`, stamped with the running crate version.
pub fn router(state: SharedState) -> Router<SharedState> {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "Arena Back".into();
    doc.info.version = env!("CARGO_PKG_VERSION").into();

    let ui: Router<SharedState> = SwaggerUi::new("/docs").url(OPENAPI_JSON_PATH, doc).into();
    ui.with_state(state)
}
