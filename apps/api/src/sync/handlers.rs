use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::validation::validate_document;
use crate::document::CvDocument;
use crate::errors::AppError;
use crate::models::account::SessionUser;
use crate::models::cv::{CvChildren, PersistedCv};
use crate::state::AppState;
use crate::store::CvStore;
use crate::sync::{delete_cv, editable_document, load_cv, save_cv, SaveOutcome};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// Caller identity as the auth provider hands it over.
#[derive(Deserialize)]
pub struct SessionFields {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl From<SessionFields> for SessionUser {
    fn from(fields: SessionFields) -> Self {
        SessionUser {
            user_id: fields.user_id,
            email: fields.email,
            full_name: fields.full_name,
        }
    }
}

#[derive(Deserialize)]
pub struct SaveCvRequest {
    #[serde(flatten)]
    pub session: SessionFields,
    pub document: CvDocument,
}

#[derive(Serialize)]
pub struct CvDetailResponse {
    pub cv: PersistedCv,
    pub children: CvChildren,
    pub document: CvDocument,
}

/// Rejects a document that must not reach the store.
pub(crate) fn ensure_valid(document: &CvDocument) -> Result<(), AppError> {
    let problems = validate_document(document);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PersistedCv>>, AppError> {
    let cvs = state.store.list_cvs(params.user_id).await?;
    Ok(Json(cvs))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CvDetailResponse>, AppError> {
    let loaded = load_cv(state.store.as_ref(), id).await?;
    let document = editable_document(&loaded);
    Ok(Json(CvDetailResponse {
        cv: loaded.cv,
        children: loaded.children,
        document,
    }))
}

/// POST /api/v1/cvs
pub async fn handle_create_cv(
    State(state): State<AppState>,
    Json(req): Json<SaveCvRequest>,
) -> Result<(StatusCode, Json<SaveOutcome>), AppError> {
    ensure_valid(&req.document)?;
    let user = SessionUser::from(req.session);
    let outcome = save_cv(state.store.clone(), &user, &req.document, None).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/v1/cvs/:id
pub async fn handle_update_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveCvRequest>,
) -> Result<Json<SaveOutcome>, AppError> {
    ensure_valid(&req.document)?;
    let user = SessionUser::from(req.session);
    let outcome = save_cv(state.store.clone(), &user, &req.document, Some(id)).await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/cvs/:id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_cv(state.store.clone(), id)
        .await
        .map_err(AppError::from_delete)?;
    Ok(StatusCode::NO_CONTENT)
}
