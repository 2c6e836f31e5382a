use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::account::{get_or_create_profile, update_parameters};
use crate::errors::AppError;
use crate::models::account::{ParametersPatch, SessionUser, UserParameters, UserProfile};
use crate::state::AppState;
use crate::store::AccountStore;
use crate::sync::handlers::{SessionFields, UserIdQuery};

#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub summary: Option<String>,
}

#[derive(Deserialize)]
pub struct ParametersRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub patch: ParametersPatch,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(session): Query<SessionFields>,
) -> Result<Json<UserProfile>, AppError> {
    let user = SessionUser::from(session);
    Ok(Json(get_or_create_profile(state.store.as_ref(), &user).await?))
}

/// PUT /api/v1/profile
///
/// Overwrites every field; omitted fields are cleared.
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let email = blank_to_none(req.email);
    if let Some(email) = &email {
        if !email.validate_email() {
            return Err(AppError::Validation(format!(
                "email '{email}' is not a valid address"
            )));
        }
    }
    let profile = UserProfile {
        id: req.user_id,
        full_name: blank_to_none(req.full_name),
        email,
        phone: blank_to_none(req.phone),
        address: blank_to_none(req.address),
        summary: blank_to_none(req.summary),
        updated_at: Utc::now(),
    };
    Ok(Json(state.store.upsert_profile(profile).await?))
}

/// GET /api/v1/parameters
pub async fn handle_get_parameters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserParameters>, AppError> {
    Ok(Json(state.store.ensure_parameters(params.user_id).await?))
}

/// PATCH /api/v1/parameters
pub async fn handle_patch_parameters(
    State(state): State<AppState>,
    Json(req): Json<ParametersRequest>,
) -> Result<Json<UserParameters>, AppError> {
    let parameters = update_parameters(state.store.as_ref(), req.user_id, req.patch).await?;
    Ok(Json(parameters))
}
