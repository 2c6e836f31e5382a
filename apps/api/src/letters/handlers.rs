use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::letters::{letter_title, new_letter};
use crate::models::letter::Letter;
use crate::state::AppState;
use crate::store::LetterStore;
use crate::sync::handlers::UserIdQuery;

#[derive(Deserialize)]
pub struct CreateLetterRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateLetterRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct EnhanceLetterRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct EnhancedLetter {
    pub content: String,
}

/// GET /api/v1/letters
pub async fn handle_list_letters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Letter>>, AppError> {
    Ok(Json(state.store.list_letters(params.user_id).await?))
}

/// POST /api/v1/letters
pub async fn handle_create_letter(
    State(state): State<AppState>,
    Json(req): Json<CreateLetterRequest>,
) -> Result<(StatusCode, Json<Letter>), AppError> {
    let letter = state
        .store
        .insert_letter(new_letter(req.user_id, &req.title, req.content))
        .await?;
    tracing::info!("Created letter {} for user {}", letter.id, letter.user_id);
    Ok((StatusCode::CREATED, Json(letter)))
}

/// PUT /api/v1/letters/:id
pub async fn handle_update_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLetterRequest>,
) -> Result<Json<Letter>, AppError> {
    state
        .store
        .update_letter(id, letter_title(&req.title), req.content)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Letter {id} not found")))
}

/// DELETE /api/v1/letters/:id
pub async fn handle_delete_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_letter(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Letter {id} not found")))
    }
}

/// POST /api/v1/letters/enhance
pub async fn handle_enhance_letter(
    State(state): State<AppState>,
    Json(req): Json<EnhanceLetterRequest>,
) -> Result<Json<EnhancedLetter>, AppError> {
    let config = state.ai_settings.get().await;
    let content = state.enhancer.enhance_letter(&config, &req.content).await?;
    Ok(Json(EnhancedLetter { content }))
}
