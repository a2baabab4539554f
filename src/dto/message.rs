use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::MessageEntity, dto::profile::ProfileSummary};

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Chat message enriched with its author's profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageView {
    pub id: Uuid,
    pub game_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    pub author: ProfileSummary,
}

impl MessageView {
    pub fn new(message: MessageEntity, author: ProfileSummary) -> Self {
        Self {
            id: message.id,
            game_id: message.game_id,
            content: message.content,
            created_at: message.created_at,
            author,
        }
    }
}

/// New chat message. Surrounding whitespace is trimmed before storage.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}
