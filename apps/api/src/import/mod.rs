//! Import bridge: forwards an uploaded CV file to the OCR webhook and turns whatever
//! JSON comes back into an editable document.
//!
//! Size and type are checked before any request is made. Once the file has been
//! sent, every failure produces `ImportOutcome::Fallback` with a blank document so
//! the user still lands in the editor.

pub mod handlers;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::document::lists::{MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::document::{
    CvDocument, Education, EntryList, Experience, Hobby, Skill, DEFAULT_SKILL_LEVEL,
    PLACEHOLDER_TITLE,
};

/// Largest accepted upload, inclusive.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field name the webhook reads the file from.
pub const UPLOAD_FIELD: &str = "fichier";

static ACCEPTED_TYPES: [(&str, &str); 3] = [
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("File is too large ({size} bytes); the maximum is 5MB")]
    TooLarge { size: usize },

    #[error("Unsupported file format '{0}'; use PDF, DOC or DOCX")]
    UnsupportedType(String),
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Parsed { document: CvDocument },
    Fallback { document: CvDocument, reason: String },
}

impl ImportOutcome {
    pub fn document(&self) -> &CvDocument {
        match self {
            ImportOutcome::Parsed { document } | ImportOutcome::Fallback { document, .. } => {
                document
            }
        }
    }

    pub fn into_document(self) -> CvDocument {
        match self {
            ImportOutcome::Parsed { document } | ImportOutcome::Fallback { document, .. } => {
                document
            }
        }
    }
}

/// Returns the canonical MIME type of an acceptable upload.
pub fn validate_upload(upload: &Upload) -> Result<&'static str, ImportError> {
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImportError::TooLarge {
            size: upload.bytes.len(),
        });
    }

    let declared = upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    let by_declared = declared.as_deref().and_then(|ct| {
        ACCEPTED_TYPES
            .iter()
            .find(|(mime, _)| *mime == ct)
            .map(|(mime, _)| *mime)
    });
    if let Some(mime) = by_declared {
        return Ok(mime);
    }
    if let Some(declared) = declared {
        return Err(ImportError::UnsupportedType(declared));
    }

    let extension = upload
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension {
        Some(ext) => ACCEPTED_TYPES
            .iter()
            .find(|(_, known)| *known == ext)
            .map(|(mime, _)| *mime)
            .ok_or(ImportError::UnsupportedType(format!(".{ext}"))),
        None => Err(ImportError::UnsupportedType(
            "application/octet-stream".to_string(),
        )),
    }
}

#[derive(Clone)]
pub struct OcrClient {
    client: Client,
    url: String,
}

impl OcrClient {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the OCR webhook")?;
        Ok(Self { client, url })
    }

    pub async fn import(&self, upload: Upload) -> Result<ImportOutcome, ImportError> {
        let mime = validate_upload(&upload)?;
        let size = upload.bytes.len();

        let outcome = match self.send(mime, upload).await {
            Ok(value) => {
                info!("Imported CV from a {size} byte upload");
                ImportOutcome::Parsed {
                    document: coerce_document(&value),
                }
            }
            Err(reason) => {
                warn!("CV import fell back to a blank document: {reason}");
                ImportOutcome::Fallback {
                    document: CvDocument::new(),
                    reason,
                }
            }
        };
        Ok(outcome)
    }

    async fn send(&self, mime: &str, upload: Upload) -> Result<Value, String> {
        let file_name = upload.file_name.unwrap_or_else(|| "cv".to_string());
        let part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| e.to_string())?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("OCR request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("OCR server error: {}", status.as_u16()));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| format!("OCR response is not JSON: {e}"))?;

        // The webhook sometimes answers with a one-element array.
        let value = match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
        if !value.is_object() {
            return Err("No data received from the OCR server".to_string());
        }
        Ok(value)
    }
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn skill_level(value: &Value) -> u8 {
    value
        .get("level")
        .and_then(Value::as_f64)
        .map(|level| level.round().clamp(MIN_SKILL_LEVEL as f64, MAX_SKILL_LEVEL as f64) as u8)
        .unwrap_or(DEFAULT_SKILL_LEVEL)
}

fn coerce_skills(value: Option<&Value>) -> EntryList<Skill> {
    let mut skills = EntryList::default();
    let Some(Value::Array(items)) = value else {
        return skills;
    };

    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut seen = HashSet::new();
    for item in items {
        let (name, level, id) = match item {
            Value::String(name) => (name.trim().to_string(), DEFAULT_SKILL_LEVEL, None),
            Value::Object(_) => (
                text(item, "name").trim().to_string(),
                skill_level(item),
                item.get("id").and_then(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            ),
            _ => continue,
        };
        if name.is_empty() {
            continue;
        }
        let id = match id {
            Some(id) if !seen.contains(&id) => id,
            _ => skills.fresh_id(now_ms),
        };
        seen.insert(id.clone());
        skills.add(Skill { id, name, level });
    }
    skills
}

fn coerce_list<T: Default>(value: Option<&Value>, entry: impl Fn(&Value) -> T) -> EntryList<T> {
    match value {
        Some(Value::Array(items)) => items.iter().map(entry).collect::<Vec<_>>().into(),
        _ => vec![T::default()].into(),
    }
}

/// Builds a document from the webhook's loosely typed JSON. Missing or mistyped
/// fields fall back to their blank values.
pub fn coerce_document(value: &Value) -> CvDocument {
    let title = text(value, "title");
    CvDocument {
        title: if title.trim().is_empty() {
            PLACEHOLDER_TITLE.to_string()
        } else {
            title
        },
        full_name: text(value, "fullName"),
        email: text(value, "email"),
        phone: text(value, "phone"),
        address: text(value, "address"),
        summary: text(value, "summary"),
        skills: coerce_skills(value.get("skills")),
        experience: coerce_list(value.get("experience"), |e| Experience {
            company: text(e, "company"),
            position: text(e, "position"),
            start_date: text(e, "startDate"),
            end_date: text(e, "endDate"),
            description: text(e, "description"),
        }),
        education: coerce_list(value.get("education"), |e| Education {
            school: text(e, "school"),
            degree: text(e, "degree"),
            start_date: text(e, "startDate"),
            end_date: text(e, "endDate"),
            description: text(e, "description"),
        }),
        hobbies: coerce_list(value.get("hobbies"), |h| Hobby {
            name: text(h, "name"),
            description: text(h, "description"),
        }),
    }
}
