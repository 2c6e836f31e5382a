use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_OCR_WEBHOOK_URL: &str = "https://n8n.srv760758.hstgr.cloud/webhook-test/OCR";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// `memory://` selects the in-process store.
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub ocr_webhook_url: String,
    pub ai_config_path: Option<PathBuf>,
    /// Replaces every AI provider endpoint; used against local mocks.
    pub ai_base_url: Option<String>,
    pub draft_ttl: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ocr_webhook_url: std::env::var("OCR_WEBHOOK_URL")
                .unwrap_or_else(|_| DEFAULT_OCR_WEBHOOK_URL.to_string()),
            ai_config_path: optional_env("AI_CONFIG_PATH").map(PathBuf::from),
            ai_base_url: optional_env("AI_BASE_URL"),
            draft_ttl: seconds_env("DRAFT_TTL_SECS", 86_400)?,
            http_timeout: seconds_env("HTTP_TIMEOUT_SECS", 60)?,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn seconds_env(key: &str, default: u64) -> Result<Duration> {
    let secs = match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
