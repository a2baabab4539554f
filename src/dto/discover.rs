use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::Coordinates;

/// Optional caller position used to centre the map.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct DiscoverQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

impl DiscoverQuery {
    /// Both coordinates, when the caller supplied them.
    pub fn position(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

/// Initial view handed to the map widget.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapView {
    /// Public access token for the tile provider, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub style: String,
    pub center: Coordinates,
    pub zoom: f64,
}

/// One pin on the discover map.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapMarker {
    pub game_id: Uuid,
    pub lng: f64,
    pub lat: f64,
    /// Game title shown in the popup.
    pub label: String,
    pub sport: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: OffsetDateTime,
    pub player_count: usize,
    pub max_players: u32,
}

/// Map view plus one marker per upcoming game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiscoverResponse {
    pub view: MapView,
    pub markers: Vec<MapMarker>,
}
