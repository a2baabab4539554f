use crate::{
    config::AppConfig,
    dao::{
        models::{Coordinates, GameEntity, GameStatus},
        query::GameQuery,
    },
    dto::discover::{DiscoverQuery, DiscoverResponse, MapMarker, MapView},
    error::ServiceError,
    services::lifecycle,
    state::SharedState,
};

/// Map view centred on the caller plus a marker for every upcoming game.
pub async fn discover(
    state: &SharedState,
    query: &DiscoverQuery,
) -> Result<DiscoverResponse, ServiceError> {
    let store = state.require_store().await?;
    let games = store.list_games(GameQuery::upcoming()).await?;
    let games = lifecycle::evaluate(&store, state.feed(), games, state.now()).await;

    let config = state.config();
    let markers = games
        .into_iter()
        .filter(|game| game.status == GameStatus::Upcoming)
        .map(|game| marker(config, game))
        .collect();

    let map = config.map();
    Ok(DiscoverResponse {
        view: MapView {
            access_token: map.access_token.clone(),
            style: map.style.clone(),
            center: query.position().unwrap_or(map.center),
            zoom: map.zoom,
        },
        markers,
    })
}

/// Explicit coordinates, else the city table, else the default centre.
pub fn marker_position(config: &AppConfig, game: &GameEntity) -> Coordinates {
    game.coordinates
        .or_else(|| config.city_coordinates(&game.location))
        .unwrap_or(config.map().center)
}

fn marker(config: &AppConfig, game: GameEntity) -> MapMarker {
    let Coordinates { lat, lng } = marker_position(config, &game);
    MapMarker {
        game_id: game.id,
        lng,
        lat,
        player_count: game.player_count(),
        label: game.title,
        sport: game.sport,
        location: game.location,
        scheduled_at: game.scheduled_at,
        max_players: game.max_players,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;

    fn game(location: &str, coordinates: Option<Coordinates>) -> GameEntity {
        let creator = Uuid::new_v4();
        GameEntity {
            id: Uuid::new_v4(),
            creator_id: creator,
            title: "Pickup".into(),
            sport: "Basketball".into(),
            location: location.into(),
            coordinates,
            scheduled_at: datetime!(2030-03-01 17:00 UTC),
            max_players: 10,
            registered_players: vec![creator],
            description: None,
            status: GameStatus::Upcoming,
            created_at: datetime!(2026-01-01 00:00 UTC),
            version: 1,
        }
    }

    #[test]
    fn marker_position_prefers_explicit_coordinates() {
        let config = AppConfig::default();
        let pinned = Coordinates { lat: 1.5, lng: 2.5 };

        assert_eq!(marker_position(&config, &game("Austin", Some(pinned))), pinned);
        assert_eq!(
            marker_position(&config, &game("Austin", None)),
            Coordinates { lat: 30.2672, lng: -97.7431 }
        );
        assert_eq!(
            marker_position(&config, &game("Somewhere unknown", None)),
            config.map().center
        );
    }
}
