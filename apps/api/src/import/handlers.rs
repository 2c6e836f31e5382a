use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::drafts::DraftView;
use crate::errors::AppError;
use crate::import::{ImportOutcome, Upload, UPLOAD_FIELD};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub outcome: ImportOutcome,
    /// Present when a `user_id` field was sent: the imported document is already
    /// open for editing.
    pub draft: Option<DraftView>,
}

/// POST /api/v1/import
///
/// Multipart body: the file in `fichier`, optionally a `user_id` text field.
pub async fn handle_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut upload = None;
    let mut user_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(UPLOAD_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read the file: {e}")))?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("user_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id: {e}")))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?;
                user_id = Some(id);
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Please select a file".to_string()))?;
    let outcome = state.importer.import(upload).await?;

    let draft = match user_id {
        Some(user_id) => Some(
            state
                .drafts
                .open(user_id, None, outcome.document().clone())
                .await,
        ),
        None => None,
    };
    Ok(Json(ImportResponse { outcome, draft }))
}
