use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{identity::Identity, models::ProfileEntity},
    dto::profile::{ProfileView, UpdateProfileRequest},
    error::ServiceError,
    services::change_events,
    state::{CurrentUser, SharedState},
};

/// Profile of `identity`, created from the identity on first sign-in.
pub async fn ensure_profile(
    state: &SharedState,
    identity: &Identity,
) -> Result<ProfileEntity, ServiceError> {
    let store = state.require_store().await?;
    if let Some(profile) = store.find_profile(identity.id).await? {
        return Ok(profile);
    }

    let profile = store
        .save_profile(ProfileEntity::from_identity(identity, state.now()))
        .await?;
    info!(user_id = %profile.id, "profile created on first sign-in");
    change_events::profile_saved(state.feed(), None, &profile);
    Ok(profile)
}

/// The caller's own profile.
pub async fn my_profile(state: &SharedState, user: &CurrentUser) -> Result<ProfileView, ServiceError> {
    ensure_profile(state, &user.identity).await.map(Into::into)
}

/// Any user's profile.
pub async fn get_profile(state: &SharedState, id: Uuid) -> Result<ProfileView, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_profile(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("profile `{id}` not found")))
}

/// Partial update of the caller's own profile.
pub async fn update_my_profile(
    state: &SharedState,
    user: &CurrentUser,
    request: UpdateProfileRequest,
) -> Result<ProfileView, ServiceError> {
    let previous = ensure_profile(state, &user.identity).await?;
    let mut profile = previous.clone();

    let UpdateProfileRequest {
        full_name,
        avatar_url,
        bio,
        location,
        preferred_sports,
        skill_levels,
    } = request;

    if let Some(full_name) = full_name {
        profile.full_name = non_empty(full_name);
    }
    if let Some(avatar_url) = avatar_url {
        profile.avatar_url = Some(avatar_url);
    }
    if let Some(bio) = bio {
        profile.bio = non_empty(bio);
    }
    if let Some(location) = location {
        profile.location = non_empty(location);
    }
    if let Some(sports) = preferred_sports {
        profile.preferred_sports = known_sports(state, sports)?;
    }
    if let Some(levels) = skill_levels {
        if let Some(unknown) = levels.keys().find(|sport| !state.config().is_known_sport(sport)) {
            return Err(ServiceError::InvalidInput(format!("unknown sport `{unknown}`")));
        }
        profile.skill_levels = levels;
    }

    if profile == previous {
        return Ok(profile.into());
    }
    profile.updated_at = state.now();

    let store = state.require_store().await?;
    let saved = store.save_profile(profile).await?;
    info!(user_id = %saved.id, "profile updated");
    change_events::profile_saved(state.feed(), Some(&previous), &saved);
    Ok(saved.into())
}

/// Validate against the configured list and drop duplicates, keeping the first occurrence.
fn known_sports(state: &SharedState, sports: Vec<String>) -> Result<Vec<String>, ServiceError> {
    let mut unique = Vec::with_capacity(sports.len());
    for sport in sports {
        if !state.config().is_known_sport(&sport) {
            return Err(ServiceError::InvalidInput(format!("unknown sport `{sport}`")));
        }
        if !unique.contains(&sport) {
            unique.push(sport);
        }
    }
    Ok(unique)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::MemoryStore, identity::memory::MemoryIdentityProvider,
            models::SkillLevel,
        },
        state::AppState,
    };

    fn user() -> CurrentUser {
        CurrentUser {
            identity: Identity {
                id: Uuid::new_v4(),
                email: Some("ravi@example.com".into()),
                display_name: Some("Ravi".into()),
                avatar_url: Some("https://img.example.com/ravi.png".into()),
            },
            token: "ravi".into(),
        }
    }

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryIdentityProvider::new()));
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    #[tokio::test]
    async fn first_sign_in_seeds_the_profile_from_the_identity() {
        let state = state().await;
        let caller = user();

        let profile = my_profile(&state, &caller).await.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ravi"));
        assert_eq!(profile.email.as_deref(), Some("ravi@example.com"));
        assert!(get_profile(&state, caller.id()).await.is_ok());
        assert!(matches!(
            get_profile(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_deduplicates_sports_and_clears_blank_fields() {
        let state = state().await;
        let caller = user();

        let updated = update_my_profile(
            &state,
            &caller,
            UpdateProfileRequest {
                bio: Some("  ".into()),
                location: Some("India, Karnataka, Mysore".into()),
                preferred_sports: Some(vec!["Tennis".into(), "Cricket".into(), "Tennis".into()]),
                skill_levels: Some(BTreeMap::from([("Tennis".to_string(), SkillLevel::Advanced)])),
                ..UpdateProfileRequest::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.preferred_sports, ["Tennis", "Cricket"]);
        assert_eq!(updated.bio, None);
        assert_eq!(updated.location.as_deref(), Some("India, Karnataka, Mysore"));
        assert_eq!(updated.skill_levels["Tennis"], SkillLevel::Advanced);
    }

    #[tokio::test]
    async fn unknown_sports_are_rejected() {
        let state = state().await;
        let result = update_my_profile(
            &state,
            &user(),
            UpdateProfileRequest {
                preferred_sports: Some(vec!["Curling on ice".into()]),
                ..UpdateProfileRequest::default()
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
