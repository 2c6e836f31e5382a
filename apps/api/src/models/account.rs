use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Read-only identity from the authentication provider, used to stamp writes.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl SessionUser {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
            full_name: None,
        }
    }
}

/// One per user, keyed by the user id. Always written whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub summary: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserParameters {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notifications_email: bool,
    pub notifications_updates: bool,
    pub language: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_LANGUAGE: &str = "fr";
pub const DEFAULT_THEME: &str = "light";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParametersPatch {
    pub notifications_email: Option<bool>,
    pub notifications_updates: Option<bool>,
    pub language: Option<String>,
    pub theme: Option<String>,
}

impl ParametersPatch {
    pub fn is_empty(&self) -> bool {
        self.notifications_email.is_none()
            && self.notifications_updates.is_none()
            && self.language.is_none()
            && self.theme.is_none()
    }
}
