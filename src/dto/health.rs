use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the last storage ping succeeded.
    pub storage_reachable: bool,
}

impl HealthResponse {
    /// Build the payload from the degraded flag and the ping outcome.
    pub fn new(degraded: bool, storage_reachable: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_string(),
            storage_reachable,
        }
    }
}
