//! Process-wide AI configuration slot. Handlers read a copy and pass it to the
//! enhancement client; nothing below this module reads the slot itself.

pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    DeepSeek,
    #[default]
    OpenAi,
    Gemini,
}

impl AiProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            AiProvider::DeepSeek => "DeepSeek",
            AiProvider::OpenAi => "OpenAI GPT-4",
            AiProvider::Gemini => "Google Gemini",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub model: AiProvider,
    #[serde(default)]
    pub api_key: String,
}

impl AiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The first and last few characters of the key, for display.
    pub fn masked_key(&self) -> String {
        let key = self.api_key.trim();
        let chars: Vec<char> = key.chars().collect();
        if chars.is_empty() {
            String::new()
        } else if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

/// Shared slot, optionally mirrored to a JSON file so it survives restarts.
/// Last write wins.
#[derive(Clone)]
pub struct AiSettings {
    slot: Arc<RwLock<AiConfig>>,
    path: Option<PathBuf>,
}

impl AiSettings {
    pub fn in_memory(config: AiConfig) -> Self {
        Self {
            slot: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    /// Loads the file at `path` if it exists; a missing or unreadable file starts
    /// from the default configuration.
    pub async fn load(path: PathBuf) -> Self {
        let config = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<AiConfig>(&bytes) {
                Ok(config) => {
                    info!("Loaded AI settings from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed AI settings at {}: {e}", path.display());
                    AiConfig::default()
                }
            },
            Err(_) => AiConfig::default(),
        };
        Self {
            slot: Arc::new(RwLock::new(config)),
            path: Some(path),
        }
    }

    pub async fn get(&self) -> AiConfig {
        self.slot.read().await.clone()
    }

    /// Replaces the whole configuration. When file-backed, the file is written
    /// first, under the write lock, and the slot changes only if that succeeded.
    pub async fn set(&self, config: AiConfig) -> Result<()> {
        let mut slot = self.slot.write().await;
        if let Some(path) = &self.path {
            let body = serde_json::to_vec_pretty(&config)?;
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("Failed to write AI settings to {}", path.display()))?;
        }
        info!("AI settings updated (provider: {:?})", config.model);
        *slot = config;
        Ok(())
    }
}
