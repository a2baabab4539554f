use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    Coordinates, GameEntity, GameStatus, MessageEntity, ProfileEntity, SkillLevel,
};

pub const GAMES_TABLE: &str = "games";
pub const PROFILES_TABLE: &str = "profiles";
pub const MESSAGES_TABLE: &str = "game_messages";

/// Row of the `games` table as exposed by PostgREST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub sport: String,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub max_players: i32,
    #[serde(default)]
    pub registered_players: Vec<Uuid>,
    pub description: Option<String>,
    pub status: GameStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

impl From<GameEntity> for GameRow {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            creator_id: game.creator_id,
            title: game.title,
            sport: game.sport,
            location: game.location,
            latitude: game.coordinates.map(|c| c.lat),
            longitude: game.coordinates.map(|c| c.lng),
            date: game.scheduled_at,
            max_players: i32::try_from(game.max_players).unwrap_or(i32::MAX),
            registered_players: game.registered_players,
            description: game.description,
            status: game.status,
            created_at: game.created_at,
            version: i64::try_from(game.version).unwrap_or(i64::MAX),
        }
    }
}

impl From<GameRow> for GameEntity {
    fn from(row: GameRow) -> Self {
        let coordinates = row
            .latitude
            .zip(row.longitude)
            .map(|(lat, lng)| Coordinates { lat, lng });

        // Roster columns written by older clients may contain duplicates.
        let mut registered_players = Vec::with_capacity(row.registered_players.len());
        for player in row.registered_players {
            if !registered_players.contains(&player) {
                registered_players.push(player);
            }
        }

        Self {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            sport: row.sport,
            location: row.location,
            coordinates,
            scheduled_at: row.date,
            max_players: u32::try_from(row.max_players).unwrap_or(0),
            registered_players,
            description: row.description,
            status: row.status,
            created_at: row.created_at,
            version: u64::try_from(row.version).unwrap_or(0),
        }
    }
}

/// Row of the `profiles` table; array and JSON columns may be null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub preferred_sports: Option<Vec<String>>,
    pub skill_levels: Option<BTreeMap<String, SkillLevel>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ProfileEntity> for ProfileRow {
    fn from(profile: ProfileEntity) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            location: profile.location,
            preferred_sports: Some(profile.preferred_sports),
            skill_levels: Some(profile.skill_levels),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

impl From<ProfileRow> for ProfileEntity {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            bio: row.bio,
            location: row.location,
            preferred_sports: row.preferred_sports.unwrap_or_default(),
            skill_levels: row.skill_levels.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row of the `game_messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MessageEntity> for MessageRow {
    fn from(message: MessageEntity) -> Self {
        Self {
            id: message.id,
            game_id: message.game_id,
            user_id: message.user_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

impl From<MessageRow> for MessageEntity {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            game_id: row.game_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Render a UUID list as a PostgREST `in.(…)` operand.
pub fn in_list(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}
