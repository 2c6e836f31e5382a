use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Letter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Rich-text body as HTML.
    pub content: String,
    pub letter_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLetter {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub letter_type: String,
}
