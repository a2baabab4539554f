use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{ProfileEntity, SkillLevel};

/// Full profile as shown on the profile page.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub preferred_sports: Vec<String>,
    pub skill_levels: BTreeMap<String, SkillLevel>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl From<ProfileEntity> for ProfileView {
    fn from(profile: ProfileEntity) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            location: profile.location,
            preferred_sports: profile.preferred_sports,
            skill_levels: profile.skill_levels,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Name and avatar of a host, participant or message author.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileSummary {
    /// Placeholder for users whose profile row does not exist (yet).
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            full_name: None,
            avatar_url: None,
        }
    }
}

impl From<&ProfileEntity> for ProfileSummary {
    fn from(profile: &ProfileEntity) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Partial profile update. Omitted fields are left untouched; an empty string
/// clears `full_name`, `bio` or `location`.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    /// "Country, State, City".
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub preferred_sports: Option<Vec<String>>,
    pub skill_levels: Option<BTreeMap<String, SkillLevel>>,
}
