use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::identity::Identity;

/// Lifecycle status of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Scheduled in the future (or not yet reclassified).
    Upcoming,
    /// Currently being played.
    InProgress,
    /// Scheduled time has passed.
    Completed,
    /// Called off by its owner.
    Cancelled,
}

impl GameStatus {
    /// Column value used by the relational store.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Upcoming => "upcoming",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
            GameStatus::Cancelled => "cancelled",
        }
    }

    /// Whether participants may still exchange chat messages.
    pub fn allows_chat(&self) -> bool {
        !matches!(self, GameStatus::Cancelled)
    }
}

/// Geographic position of a game or a map centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Scheduled sports meetup persisted in the `games` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Identity of the owner; the only user allowed to edit, cancel or delete.
    pub creator_id: Uuid,
    pub title: String,
    /// Sport category, one of the configured sports.
    pub sport: String,
    /// Address or city label.
    pub location: String,
    /// Explicit position, when the creator supplied one.
    pub coordinates: Option<Coordinates>,
    /// When the game takes place.
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    /// Capacity of the roster.
    pub max_players: u32,
    /// Registered participants. Treated as a set: no duplicates, order irrelevant.
    pub registered_players: Vec<Uuid>,
    pub description: Option<String>,
    pub status: GameStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Optimistic-concurrency token, bumped by the store on every update.
    pub version: u64,
}

impl GameEntity {
    /// Number of registered participants.
    pub fn player_count(&self) -> usize {
        self.registered_players.len()
    }

    /// True once the roster reached (or, after a race, exceeded) capacity.
    pub fn is_full(&self) -> bool {
        self.player_count() >= self.max_players as usize
    }

    /// Whether `user` is part of the roster.
    pub fn is_registered(&self, user: Uuid) -> bool {
        self.registered_players.contains(&user)
    }

    /// Whether `user` created the game.
    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.creator_id == user
    }

    /// Whether the scheduled time is strictly before `now`.
    pub fn is_past(&self, now: OffsetDateTime) -> bool {
        self.scheduled_at < now
    }

    /// Status as of `now`: an `upcoming` game whose time has passed reads as
    /// `completed` even before the lifecycle write lands.
    pub fn effective_status(&self, now: OffsetDateTime) -> GameStatus {
        match self.status {
            GameStatus::Upcoming if self.is_past(now) => GameStatus::Completed,
            status => status,
        }
    }
}

/// Self-assessed level for a sport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[serde(rename = "Semi-Professional")]
    SemiPro,
}

/// User profile persisted in the `profiles` table, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    /// Free text, conventionally "Country, State, City".
    pub location: Option<String>,
    /// Preferred sport categories (a set).
    #[serde(default)]
    pub preferred_sports: Vec<String>,
    #[serde(default)]
    pub skill_levels: BTreeMap<String, SkillLevel>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProfileEntity {
    /// Seed a profile from the identity returned on first sign-in.
    pub fn from_identity(identity: &Identity, now: OffsetDateTime) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            full_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            bio: None,
            location: None,
            preferred_sports: Vec::new(),
            skill_levels: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Chat message posted on a game, persisted in the `game_messages` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
