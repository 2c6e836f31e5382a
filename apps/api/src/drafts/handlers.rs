use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::document::lists::{MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::document::{CvDocument, CvField, CvPatch, Education, Experience, Hobby, ListKind};
use crate::drafts::{DraftHandle, DraftView};
use crate::errors::AppError;
use crate::models::account::SessionUser;
use crate::state::AppState;
use crate::sync::handlers::ensure_valid;
use crate::sync::{editable_document, load_cv, save_cv, SaveOutcome};

#[derive(Deserialize)]
pub struct OpenDraftRequest {
    pub user_id: Uuid,
    /// Opens a stored CV for editing.
    pub cv_id: Option<Uuid>,
    /// Starting content, e.g. the document returned by an import.
    pub document: Option<CvDocument>,
}

#[derive(Deserialize, Default)]
pub struct SaveDraftRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct EnhanceFieldRequest {
    #[serde(default = "default_enhanced_field")]
    pub field: CvField,
}

fn default_enhanced_field() -> CvField {
    CvField::Summary
}

#[derive(Deserialize, Default)]
pub struct AddEntryRequest {
    /// Required for skills, ignored for the other lists.
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Deserialize)]
pub struct ReorderSkillsRequest {
    pub active_id: String,
    pub over_id: String,
}

#[derive(Deserialize)]
pub struct LevelRequest {
    pub level: u8,
}

#[derive(Deserialize)]
struct SkillEdit {
    name: String,
    level: u8,
}

async fn draft(state: &AppState, id: Uuid) -> Result<DraftHandle, AppError> {
    state
        .drafts
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Draft {id} not found")))
}

fn check_level(level: u8) -> Result<(), AppError> {
    if (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Skill level must be between {MIN_SKILL_LEVEL} and {MAX_SKILL_LEVEL}"
        )))
    }
}

fn parse_entry<T: serde::de::DeserializeOwned>(entry: Value) -> Result<T, AppError> {
    serde_json::from_value(entry).map_err(|e| AppError::Validation(format!("Invalid entry: {e}")))
}

/// POST /api/v1/drafts
pub async fn handle_open_draft(
    State(state): State<AppState>,
    Json(req): Json<OpenDraftRequest>,
) -> Result<(StatusCode, Json<DraftView>), AppError> {
    let document = match (req.cv_id, req.document) {
        (Some(cv_id), _) => editable_document(&load_cv(state.store.as_ref(), cv_id).await?),
        (None, Some(document)) => {
            ensure_valid(&document)?;
            document
        }
        (None, None) => CvDocument::new(),
    };
    let view = state.drafts.open(req.user_id, req.cv_id, document).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/drafts/:id
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let draft = handle.lock().await;
    Ok(Json(DraftView::from(&*draft)))
}

/// PATCH /api/v1/drafts/:id
pub async fn handle_patch_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CvPatch>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    draft.document.apply_patch(patch);
    Ok(Json(DraftView::from(&*draft)))
}

/// DELETE /api/v1/drafts/:id
pub async fn handle_discard_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.drafts.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Draft {id} not found")))
    }
}

/// POST /api/v1/drafts/:id/save
pub async fn handle_save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<SaveDraftRequest>>,
) -> Result<Json<SaveOutcome>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    ensure_valid(&draft.document)?;

    let user = SessionUser {
        user_id: draft.user_id,
        email: req.email,
        full_name: req.full_name,
    };
    let outcome = save_cv(state.store.clone(), &user, &draft.document, draft.cv_id).await?;
    draft.cv_id = Some(outcome.cv.id);
    draft.document.normalize();
    Ok(Json(outcome))
}

/// POST /api/v1/drafts/:id/enhance
///
/// The draft stays locked while the provider answers; the field changes only if
/// the call succeeds.
pub async fn handle_enhance_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EnhanceFieldRequest>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    let config = state.ai_settings.get().await;
    let enhanced = state
        .enhancer
        .enhance(&config, draft.document.field(req.field))
        .await?;
    draft.document.set_field(req.field, enhanced);
    Ok(Json(DraftView::from(&*draft)))
}

/// POST /api/v1/drafts/:id/lists/:list
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((id, list)): Path<(Uuid, ListKind)>,
    body: Option<Json<AddEntryRequest>>,
) -> Result<Json<DraftView>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    match list {
        ListKind::Skills => {
            let name = req
                .name
                .ok_or_else(|| AppError::Validation("A skill needs a name".to_string()))?;
            draft.document.add_skill(&name);
        }
        other => draft.document.add_blank(other),
    }
    Ok(Json(DraftView::from(&*draft)))
}

/// PUT /api/v1/drafts/:id/lists/:list/:index
pub async fn handle_replace_entry(
    State(state): State<AppState>,
    Path((id, list, index)): Path<(Uuid, ListKind, usize)>,
    Json(entry): Json<Value>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    let document = &mut draft.document;
    match list {
        ListKind::Skills => {
            let edit: SkillEdit = parse_entry(entry)?;
            check_level(edit.level)?;
            let name = edit.name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("A skill needs a name".to_string()));
            }
            let skill = document.skills.get_mut(index)?;
            skill.name = name.to_string();
            skill.level = edit.level;
        }
        ListKind::Experience => {
            document
                .experience
                .replace_at(index, parse_entry::<Experience>(entry)?)?;
        }
        ListKind::Education => {
            document
                .education
                .replace_at(index, parse_entry::<Education>(entry)?)?;
        }
        ListKind::Hobbies => {
            document
                .hobbies
                .replace_at(index, parse_entry::<Hobby>(entry)?)?;
        }
    }
    Ok(Json(DraftView::from(&*draft)))
}

/// DELETE /api/v1/drafts/:id/lists/:list/:index
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((id, list, index)): Path<(Uuid, ListKind, usize)>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    draft.document.remove_at(list, index)?;
    Ok(Json(DraftView::from(&*draft)))
}

/// POST /api/v1/drafts/:id/lists/:list/move
pub async fn handle_move_entry(
    State(state): State<AppState>,
    Path((id, list)): Path<(Uuid, ListKind)>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    draft.document.move_to(list, req.from, req.to)?;
    Ok(Json(DraftView::from(&*draft)))
}

/// POST /api/v1/drafts/:id/skills/reorder
pub async fn handle_reorder_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderSkillsRequest>,
) -> Result<Json<DraftView>, AppError> {
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    draft.document.skills.move_by_id(&req.active_id, &req.over_id)?;
    Ok(Json(DraftView::from(&*draft)))
}

/// PUT /api/v1/drafts/:id/skills/:index/level
pub async fn handle_set_skill_level(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<LevelRequest>,
) -> Result<Json<DraftView>, AppError> {
    check_level(req.level)?;
    let handle = draft(&state, id).await?;
    let mut draft = handle.lock().await;
    draft.document.skills.set_level(index, req.level)?;
    Ok(Json(DraftView::from(&*draft)))
}
