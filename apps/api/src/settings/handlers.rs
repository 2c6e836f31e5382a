use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::settings::{AiConfig, AiProvider};
use crate::state::AppState;

/// What the settings screen shows: never the key itself.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettingsView {
    pub model: AiProvider,
    pub model_name: &'static str,
    pub has_api_key: bool,
    pub masked_api_key: String,
}

impl From<&AiConfig> for AiSettingsView {
    fn from(config: &AiConfig) -> Self {
        Self {
            model: config.model,
            model_name: config.model.display_name(),
            has_api_key: config.has_api_key(),
            masked_api_key: config.masked_key(),
        }
    }
}

/// GET /api/v1/settings/ai
pub async fn handle_get_ai_settings(State(state): State<AppState>) -> Json<AiSettingsView> {
    let config = state.ai_settings.get().await;
    Json(AiSettingsView::from(&config))
}

/// PUT /api/v1/settings/ai
pub async fn handle_put_ai_settings(
    State(state): State<AppState>,
    Json(mut config): Json<AiConfig>,
) -> Result<Json<AiSettingsView>, AppError> {
    config.api_key = config.api_key.trim().to_string();
    state.ai_settings.set(config.clone()).await?;
    Ok(Json(AiSettingsView::from(&config)))
}
