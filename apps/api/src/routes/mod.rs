pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::account::handlers as account;
use crate::drafts::handlers as drafts;
use crate::import::{handlers as import, MAX_UPLOAD_BYTES};
use crate::letters::handlers as letters;
use crate::settings::handlers as settings;
use crate::state::AppState;
use crate::sync::handlers as cvs;

/// Room above the upload limit so oversized files reach the size check and get a
/// precise error instead of a bare body-limit rejection.
const IMPORT_BODY_LIMIT: usize = MAX_UPLOAD_BYTES * 2;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stored CVs
        .route(
            "/api/v1/cvs",
            get(cvs::handle_list_cvs).post(cvs::handle_create_cv),
        )
        .route(
            "/api/v1/cvs/:id",
            get(cvs::handle_get_cv)
                .put(cvs::handle_update_cv)
                .delete(cvs::handle_delete_cv),
        )
        // Edit sessions
        .route("/api/v1/drafts", post(drafts::handle_open_draft))
        .route(
            "/api/v1/drafts/:id",
            get(drafts::handle_get_draft)
                .patch(drafts::handle_patch_draft)
                .delete(drafts::handle_discard_draft),
        )
        .route("/api/v1/drafts/:id/save", post(drafts::handle_save_draft))
        .route(
            "/api/v1/drafts/:id/enhance",
            post(drafts::handle_enhance_draft),
        )
        .route(
            "/api/v1/drafts/:id/lists/:list",
            post(drafts::handle_add_entry),
        )
        .route(
            "/api/v1/drafts/:id/lists/:list/move",
            post(drafts::handle_move_entry),
        )
        .route(
            "/api/v1/drafts/:id/lists/:list/:index",
            put(drafts::handle_replace_entry).delete(drafts::handle_remove_entry),
        )
        .route(
            "/api/v1/drafts/:id/skills/reorder",
            post(drafts::handle_reorder_skills),
        )
        .route(
            "/api/v1/drafts/:id/skills/:index/level",
            put(drafts::handle_set_skill_level),
        )
        // Import
        .route(
            "/api/v1/import",
            post(import::handle_import).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        // Settings and account
        .route(
            "/api/v1/settings/ai",
            get(settings::handle_get_ai_settings).put(settings::handle_put_ai_settings),
        )
        .route(
            "/api/v1/profile",
            get(account::handle_get_profile).put(account::handle_put_profile),
        )
        .route(
            "/api/v1/parameters",
            get(account::handle_get_parameters).patch(account::handle_patch_parameters),
        )
        // Letters
        .route(
            "/api/v1/letters",
            get(letters::handle_list_letters).post(letters::handle_create_letter),
        )
        .route(
            "/api/v1/letters/enhance",
            post(letters::handle_enhance_letter),
        )
        .route(
            "/api/v1/letters/:id",
            put(letters::handle_update_letter).delete(letters::handle_delete_letter),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::settings::{AiConfig, AiProvider};
    use crate::state::testing::test_state;
    use crate::store::MemoryStore;

    async fn app_with(ai: AiConfig) -> (Router, Arc<MemoryStore>, MockServer) {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let app = build_router(test_state(store.clone(), ai, &server.uri()));
        (app, store, server)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open_draft(app: &Router, user_id: Uuid) -> String {
        let (status, draft) = send(
            app,
            Method::POST,
            "/api/v1/drafts",
            Some(json!({ "user_id": user_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        draft["id"].as_str().unwrap().to_string()
    }

    fn multipart_pdf(size: usize, user_id: Option<Uuid>) -> Request<Body> {
        let boundary = "cvbuilder-test-boundary";
        let mut body = Vec::new();
        if let Some(user_id) = user_id {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n{user_id}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"fichier\"; filename=\"cv.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat(b'%').take(size));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "cvbuilder");
    }

    #[tokio::test]
    async fn test_edit_and_save_draft() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let user_id = Uuid::new_v4();
        let id = open_draft(&app, user_id).await;

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/drafts/{id}"),
            Some(json!({ "title": "Dev CV", "fullName": "Jane Doe", "email": "jane@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, draft) = send(
            &app,
            Method::POST,
            &format!("/api/v1/drafts/{id}/lists/skills"),
            Some(json!({ "name": "Go" })),
        )
        .await;
        assert_eq!(draft["document"]["skills"][0]["level"], 3);

        let (status, draft) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/drafts/{id}/skills/0/level"),
            Some(json!({ "level": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["document"]["skills"][0]["level"], 4);

        send(
            &app,
            Method::PUT,
            &format!("/api/v1/drafts/{id}/lists/experience/0"),
            Some(json!({ "company": "Acme", "position": "Backend Engineer" })),
        )
        .await;
        send(
            &app,
            Method::PUT,
            &format!("/api/v1/drafts/{id}/lists/education/0"),
            Some(json!({ "school": "", "degree": "MSc" })),
        )
        .await;

        let (status, saved) = send(&app, Method::POST, &format!("/api/v1/drafts/{id}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["skills"], 1);
        assert_eq!(saved["experiences"], 1);
        assert_eq!(saved["educations"], 0);
        let cv_id = saved["cv"]["id"].as_str().unwrap().to_string();

        let (_, again) = send(&app, Method::POST, &format!("/api/v1/drafts/{id}/save"), None).await;
        assert_eq!(again["cv"]["id"], cv_id.as_str());

        let (_, cvs) = send(&app, Method::GET, &format!("/api/v1/cvs?user_id={user_id}"), None).await;
        assert_eq!(cvs.as_array().unwrap().len(), 1);

        let (status, detail) = send(&app, Method::GET, &format!("/api/v1/cvs/{cv_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["document"]["title"], "Dev CV");
        assert_eq!(detail["children"]["educations"].as_array().unwrap().len(), 0);
        // The snapshot keeps the incomplete education entry for the editor.
        assert_eq!(detail["document"]["education"][0]["degree"], "MSc");
    }

    #[tokio::test]
    async fn test_list_edit_errors_are_bad_requests() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let id = open_draft(&app, Uuid::new_v4()).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/drafts/{id}/skills/0/level"),
            Some(json!({ "level": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/drafts/{id}/lists/hobbies/5"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/drafts/{id}/lists/experience/move"),
            Some(json!({ "from": 0, "to": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, &format!("/api/v1/drafts/{}", Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_email_blocks_save() {
        let (app, store, _) = app_with(AiConfig::default()).await;
        let id = open_draft(&app, Uuid::new_v4()).await;
        send(&app, Method::PATCH, &format!("/api/v1/drafts/{id}"), Some(json!({ "email": "not-an-email" }))).await;

        let (status, _) = send(&app, Method::POST, &format!("/api/v1/drafts/{id}/save"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.child_counts().await.values().all(|n| *n == 0));
    }

    #[tokio::test]
    async fn test_enhance_without_key_asks_for_configuration() {
        let (app, _, server) = app_with(AiConfig::default()).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let id = open_draft(&app, Uuid::new_v4()).await;
        send(&app, Method::PATCH, &format!("/api/v1/drafts/{id}"), Some(json!({ "summary": "I code" }))).await;

        let (status, body) = send(&app, Method::POST, &format!("/api/v1/drafts/{id}/enhance"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"]["code"], "CONFIGURATION_REQUIRED");
    }

    #[tokio::test]
    async fn test_enhance_replaces_summary() {
        let (app, _, server) = app_with(AiConfig {
            model: AiProvider::OpenAi,
            api_key: "sk-test".to_string(),
        })
        .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "X" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let id = open_draft(&app, Uuid::new_v4()).await;
        send(&app, Method::PATCH, &format!("/api/v1/drafts/{id}"), Some(json!({ "summary": "I code" }))).await;

        let (status, draft) = send(
            &app,
            Method::POST,
            &format!("/api/v1/drafts/{id}/enhance"),
            Some(json!({ "field": "summary" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["document"]["summary"], "X");
    }

    #[tokio::test]
    async fn test_failed_enhance_keeps_field() {
        let (app, _, server) = app_with(AiConfig {
            model: AiProvider::DeepSeek,
            api_key: "sk-test".to_string(),
        })
        .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let id = open_draft(&app, Uuid::new_v4()).await;
        send(&app, Method::PATCH, &format!("/api/v1/drafts/{id}"), Some(json!({ "summary": "I code" }))).await;

        let (status, _) = send(&app, Method::POST, &format!("/api/v1/drafts/{id}/enhance"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let (_, draft) = send(&app, Method::GET, &format!("/api/v1/drafts/{id}"), None).await;
        assert_eq!(draft["document"]["summary"], "I code");
    }

    #[tokio::test]
    async fn test_oversized_import_is_rejected_before_upload() {
        let (app, _, server) = app_with(AiConfig::default()).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let response = app
            .clone()
            .oneshot(multipart_pdf(6 * 1024 * 1024, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_import_opens_draft() {
        let (app, _, server) = app_with(AiConfig::default()).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fullName": "John Doe",
                "skills": [{ "id": "1", "name": "JavaScript", "level": 5 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user_id = Uuid::new_v4();
        let response = app
            .clone()
            .oneshot(multipart_pdf(2048, Some(user_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "parsed");
        assert_eq!(body["document"]["fullName"], "John Doe");
        assert_eq!(body["draft"]["user_id"], user_id.to_string());

        let draft_id = body["draft"]["id"].as_str().unwrap();
        let (_, draft) = send(&app, Method::GET, &format!("/api/v1/drafts/{draft_id}"), None).await;
        assert_eq!(draft["document"]["skills"][0]["name"], "JavaScript");
    }

    #[tokio::test]
    async fn test_ai_settings_mask_key() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let (status, view) = send(
            &app,
            Method::PUT,
            "/api/v1/settings/ai",
            Some(json!({ "model": "gemini", "apiKey": " sk-abcdefghijkl " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["model"], "gemini");

        let (_, view) = send(&app, Method::GET, "/api/v1/settings/ai", None).await;
        assert_eq!(view["hasApiKey"], true);
        assert_eq!(view["maskedApiKey"], "sk-...ijkl");
        assert!(view.get("apiKey").is_none());
    }

    #[tokio::test]
    async fn test_letter_lifecycle() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let user_id = Uuid::new_v4();

        let (status, letter) = send(
            &app,
            Method::POST,
            "/api/v1/letters",
            Some(json!({ "user_id": user_id, "title": "", "content": "<p>Hello</p>" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(letter["title"], "Nouvelle lettre");
        assert_eq!(letter["letter_type"], "draft");
        let id = letter["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/letters/{id}"),
            Some(json!({ "title": "Backend role", "content": "<p>Bonjour</p>" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Backend role");

        let (_, letters) = send(&app, Method::GET, &format!("/api/v1/letters?user_id={user_id}"), None).await;
        assert_eq!(letters.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/letters/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/letters/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_and_parameters() {
        let (app, _, _) = app_with(AiConfig::default()).await;
        let user_id = Uuid::new_v4();

        let (status, profile) = send(
            &app,
            Method::GET,
            &format!("/api/v1/profile?user_id={user_id}&email=jane%40example.com"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "jane@example.com");

        let (status, profile) = send(
            &app,
            Method::PUT,
            "/api/v1/profile",
            Some(json!({ "user_id": user_id, "full_name": "Jane Doe" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["full_name"], "Jane Doe");
        assert!(profile["email"].is_null());

        let (_, params) = send(&app, Method::GET, &format!("/api/v1/parameters?user_id={user_id}"), None).await;
        assert_eq!(params["language"], "fr");
        let (_, params) = send(
            &app,
            Method::PATCH,
            "/api/v1/parameters",
            Some(json!({ "user_id": user_id, "theme": "dark" })),
        )
        .await;
        assert_eq!(params["theme"], "dark");
        assert_eq!(params["language"], "fr");
    }

    #[tokio::test]
    async fn test_create_and_delete_cv_directly() {
        let (app, store, _) = app_with(AiConfig::default()).await;
        let user_id = Uuid::new_v4();
        let (status, saved) = send(
            &app,
            Method::POST,
            "/api/v1/cvs",
            Some(json!({
                "user_id": user_id,
                "document": {
                    "title": "",
                    "skills": [{ "id": "1", "name": "Rust", "level": 5 }],
                    "hobbies": [{ "name": "Chess" }]
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["cv"]["title"], "Nouveau CV");
        assert_eq!(saved["cv"]["status"], "draft");
        assert_eq!(saved["hobbies"], 1);

        let cv_id = saved["cv"]["id"].as_str().unwrap();
        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/cvs/{cv_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.child_counts().await.values().all(|n| *n == 0));

        let (status, _) = send(&app, Method::GET, &format!("/api/v1/cvs/{cv_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
