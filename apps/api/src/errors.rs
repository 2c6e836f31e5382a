use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::ListError;
use crate::enhance::EnhanceError;
use crate::import::ImportError;
use crate::store::StoreError;
use crate::sync::SyncError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration required: {0}")]
    ConfigurationRequired(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Save failed: {0}")]
    Save(SyncError),

    #[error("Delete failed: {0}")]
    Delete(SyncError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ListError> for AppError {
    fn from(e: ListError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            ImportError::UnsupportedType(_) => AppError::UnsupportedMediaType(e.to_string()),
        }
    }
}

impl From<EnhanceError> for AppError {
    fn from(e: EnhanceError) -> Self {
        match e {
            EnhanceError::NothingToEnhance => AppError::Validation(e.to_string()),
            EnhanceError::MissingApiKey(provider) => AppError::ConfigurationRequired(format!(
                "Configure an API key for {provider} in the AI settings before enhancing text"
            )),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotFound(id) => AppError::NotFound(format!("CV {id} not found")),
            SyncError::Read(source) => AppError::Store(source),
            other => AppError::Save(other),
        }
    }
}

impl AppError {
    /// Maps a failure of `sync::delete_cv`, whose write errors are not save errors.
    pub fn from_delete(e: SyncError) -> Self {
        match e {
            SyncError::NotFound(_) | SyncError::Read(_) => e.into(),
            other => AppError::Delete(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ConfigurationRequired(msg) => (
                StatusCode::PRECONDITION_FAILED,
                "CONFIGURATION_REQUIRED",
                msg.clone(),
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    format!("AI enhancement failed: {msg}"),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Save(e) => {
                tracing::error!("Save error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SAVE_FAILED",
                    "The CV could not be saved completely; reload it and try again".to_string(),
                )
            }
            AppError::Delete(e) => {
                tracing::error!("Delete error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DELETE_FAILED",
                    "The CV could not be deleted completely; try again".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_maps_to_precondition_failed() {
        let err: AppError = EnhanceError::MissingApiKey("DeepSeek").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[test]
    fn test_import_errors_map_to_client_statuses() {
        let too_large: AppError = ImportError::TooLarge { size: 1 }.into();
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
        let wrong_type: AppError = ImportError::UnsupportedType("image/png".into()).into();
        assert_eq!(
            wrong_type.into_response().status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_list_errors_are_validation_errors() {
        let err: AppError = ListError::IndexOutOfRange { index: 3, len: 1 }.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sync_not_found_is_404() {
        let err: AppError = SyncError::NotFound(uuid::Uuid::new_v4()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn rejected() -> StoreError {
        StoreError::Rejected {
            operation: "read",
            table: "cvs",
            message: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_a_database_error() {
        let (status, body) = body_of(SyncError::Read(rejected()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_delete_failure_names_the_delete() {
        let err = SyncError::Delete {
            collection: crate::models::cv::Collection::Hobbies,
            source: rejected(),
        };
        let (status, body) = body_of(AppError::from_delete(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DELETE_FAILED");

        let (status, _) = body_of(AppError::from_delete(SyncError::Read(rejected()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) =
            body_of(AppError::from_delete(SyncError::NotFound(uuid::Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
