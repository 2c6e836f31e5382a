use std::sync::Arc;

use crate::config::Config;
use crate::drafts::DraftStore;
use crate::enhance::EnhancementClient;
use crate::import::OcrClient;
use crate::settings::AiSettings;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub drafts: Arc<DraftStore>,
    pub enhancer: EnhancementClient,
    pub importer: OcrClient,
    /// The one AI configuration slot; handlers pass a copy of it to `enhancer`.
    pub ai_settings: AiSettings,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        ai_settings: AiSettings,
        config: Config,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            drafts: Arc::new(DraftStore::new(config.draft_ttl)),
            enhancer: EnhancementClient::new(config.http_timeout, config.ai_base_url.clone())?,
            importer: OcrClient::new(config.ocr_webhook_url.clone(), config.http_timeout)?,
            ai_settings,
            config,
        })
    }
}
