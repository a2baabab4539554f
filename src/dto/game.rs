use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{Coordinates, GameEntity, GameStatus},
    dto::{profile::ProfileSummary, validation::validate_not_blank},
    services::listing::Partition,
};

/// Registration control offered to the viewer of a game card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationAction {
    /// Viewer may join.
    Register,
    /// Viewer is on the roster and may leave.
    Unregister,
    /// Roster reached capacity ("Game Full").
    Full,
    /// Game no longer accepts registrations.
    Closed,
}

impl RegistrationAction {
    /// Action available to `viewer`; anonymous viewers see the game as joinable or not.
    pub fn for_viewer(game: &GameEntity, viewer: Option<Uuid>) -> Self {
        if viewer.is_some_and(|user| game.is_registered(user)) {
            RegistrationAction::Unregister
        } else if game.status != GameStatus::Upcoming {
            RegistrationAction::Closed
        } else if game.is_full() {
            RegistrationAction::Full
        } else {
            RegistrationAction::Register
        }
    }
}

/// Game card projected for a specific viewer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameView {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub sport: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: OffsetDateTime,
    pub max_players: u32,
    pub player_count: usize,
    pub registered_players: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: GameStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    pub is_creator: bool,
    pub is_registered: bool,
    /// Owner may still edit or cancel.
    pub can_edit: bool,
    pub registration: RegistrationAction,
}

impl GameView {
    /// Project `game` for `viewer` (`None` for anonymous callers).
    pub fn for_viewer(game: GameEntity, viewer: Option<Uuid>) -> Self {
        let is_creator = viewer.is_some_and(|user| game.is_owned_by(user));
        let is_registered = viewer.is_some_and(|user| game.is_registered(user));
        let registration = RegistrationAction::for_viewer(&game, viewer);
        Self {
            id: game.id,
            creator_id: game.creator_id,
            player_count: game.player_count(),
            can_edit: is_creator && game.status == GameStatus::Upcoming,
            title: game.title,
            sport: game.sport,
            location: game.location,
            coordinates: game.coordinates,
            scheduled_at: game.scheduled_at,
            max_players: game.max_players,
            registered_players: game.registered_players,
            description: game.description,
            status: game.status,
            created_at: game.created_at,
            is_creator,
            is_registered,
            registration,
        }
    }
}

/// Games split into the "Upcoming" and "Past" sections.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameListing {
    /// Soonest first.
    pub upcoming: Vec<GameView>,
    /// Most recent first.
    pub past: Vec<GameView>,
}

impl GameListing {
    /// Project a partition for `viewer`.
    pub fn for_viewer(partition: Partition, viewer: Option<Uuid>) -> Self {
        let project = |games: Vec<GameEntity>| {
            games
                .into_iter()
                .map(|game| GameView::for_viewer(game, viewer))
                .collect()
        };
        Self {
            upcoming: project(partition.upcoming),
            past: project(partition.past),
        }
    }
}

/// Game with its host and roster profiles.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameDetails {
    pub game: GameView,
    pub host: ProfileSummary,
    /// Roster in registration order.
    pub participants: Vec<ProfileSummary>,
}

/// Outcome of a join, leave or toggle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationOutcome {
    /// Whether the caller is on the roster after the operation.
    pub registered: bool,
    pub game: GameView,
}

/// Payload used to schedule a new game.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub title: String,
    /// Must be one of the configured sports.
    pub sport: String,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: OffsetDateTime,
    #[validate(range(min = 2, max = 50))]
    pub max_players: u32,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Owner edit of an upcoming game. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateGameRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub sport: Option<String>,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub scheduled_at: Option<OffsetDateTime>,
    #[validate(range(min = 2, max = 50))]
    pub max_players: Option<u32>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn game(max_players: u32, roster: Vec<Uuid>, status: GameStatus) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            creator_id: roster.first().copied().unwrap_or_else(Uuid::new_v4),
            title: "Sunday run".into(),
            sport: "Running".into(),
            location: "Austin".into(),
            coordinates: None,
            scheduled_at: datetime!(2026-11-01 09:00 UTC),
            max_players,
            registered_players: roster,
            description: None,
            status,
            created_at: datetime!(2026-10-01 09:00 UTC),
            version: 1,
        }
    }

    #[test]
    fn full_game_offers_no_registration_to_outsiders() {
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let game = game(2, vec![host, guest], GameStatus::Upcoming);

        assert_eq!(
            RegistrationAction::for_viewer(&game, Some(Uuid::new_v4())),
            RegistrationAction::Full
        );
        assert_eq!(
            RegistrationAction::for_viewer(&game, Some(guest)),
            RegistrationAction::Unregister
        );
        assert_eq!(RegistrationAction::for_viewer(&game, None), RegistrationAction::Full);
    }

    #[test]
    fn only_the_owner_of_an_upcoming_game_can_edit() {
        let host = Uuid::new_v4();
        let view = GameView::for_viewer(game(10, vec![host], GameStatus::Upcoming), Some(host));
        assert!(view.is_creator && view.can_edit && view.is_registered);

        let view = GameView::for_viewer(game(10, vec![host], GameStatus::Completed), Some(host));
        assert!(view.is_creator && !view.can_edit);

        let view = GameView::for_viewer(game(10, vec![host], GameStatus::Upcoming), None);
        assert!(!view.is_creator && !view.can_edit);
        assert_eq!(view.registration, RegistrationAction::Register);
    }

    #[test]
    fn create_request_enforces_player_bounds_and_blank_titles() {
        let mut request = CreateGameRequest {
            title: "Pickup".into(),
            sport: "Basketball".into(),
            location: "Pune".into(),
            coordinates: None,
            scheduled_at: datetime!(2026-11-01 18:00 UTC),
            max_players: 1,
            description: None,
        };
        assert!(request.validate().is_err());

        request.max_players = 10;
        assert!(request.validate().is_ok());

        request.title = "   ".into();
        assert!(request.validate().is_err());
    }
}
