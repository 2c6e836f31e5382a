//! Per-user account records: the profile (personal info mirrored from the last
//! saved CV) and the user's parameters.

pub mod handlers;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::account::{ParametersPatch, SessionUser, UserParameters, UserProfile};
use crate::store::{AccountStore, StoreError};

/// Profile seeded from what the auth provider knows about the user.
pub fn default_profile(user: &SessionUser) -> UserProfile {
    UserProfile {
        id: user.user_id,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        phone: None,
        address: None,
        summary: None,
        updated_at: Utc::now(),
    }
}

pub async fn get_or_create_profile<S: AccountStore + ?Sized>(
    store: &S,
    user: &SessionUser,
) -> Result<UserProfile, StoreError> {
    if let Some(profile) = store.get_profile(user.user_id).await? {
        return Ok(profile);
    }
    info!("Creating profile for user {}", user.user_id);
    store.upsert_profile(default_profile(user)).await
}

/// Creates default parameters on first touch, then applies `patch`.
pub async fn update_parameters<S: AccountStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    patch: ParametersPatch,
) -> Result<UserParameters, StoreError> {
    let current = store.ensure_parameters(user_id).await?;
    if patch.is_empty() {
        return Ok(current);
    }
    Ok(store
        .update_parameters(user_id, patch)
        .await?
        .unwrap_or(current))
}
