//! Record store: the generic query client over the backend tables.
//!
//! Callers depend on `Arc<dyn RecordStore>`; `PgStore` is the production backend and
//! `MemoryStore` serves local runs (`DATABASE_URL=memory://`) and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::account::{ParametersPatch, UserParameters, UserProfile};
use crate::models::cv::{ChildRows, Collection, CvChildren, CvUpdate, NewCv, PersistedCv};
use crate::models::letter::{Letter, NewLetter};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Content serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{operation} on {table} failed: {message}")]
    Rejected {
        operation: &'static str,
        table: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait CvStore: Send + Sync {
    /// Newest first by `updated_at`.
    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<PersistedCv>, StoreError>;
    async fn get_cv(&self, id: Uuid) -> Result<Option<PersistedCv>, StoreError>;
    async fn insert_cv(&self, cv: NewCv) -> Result<PersistedCv, StoreError>;
    /// Returns `None` when no row has this id.
    async fn update_cv(&self, id: Uuid, update: CvUpdate)
        -> Result<Option<PersistedCv>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete_cv(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Deletes every row of `collection` that belongs to `cv_id`.
    async fn delete_children(&self, collection: Collection, cv_id: Uuid)
        -> Result<u64, StoreError>;
    async fn insert_children(&self, cv_id: Uuid, rows: ChildRows) -> Result<(), StoreError>;
    async fn fetch_children(&self, cv_id: Uuid) -> Result<CvChildren, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;
    /// Inserts or fully overwrites the profile with `profile.id`.
    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile, StoreError>;

    async fn get_parameters(&self, user_id: Uuid) -> Result<Option<UserParameters>, StoreError>;
    /// Inserts default parameters unless a row already exists; returns the stored row.
    async fn ensure_parameters(&self, user_id: Uuid) -> Result<UserParameters, StoreError>;
    async fn update_parameters(
        &self,
        user_id: Uuid,
        patch: ParametersPatch,
    ) -> Result<Option<UserParameters>, StoreError>;
}

#[async_trait]
pub trait LetterStore: Send + Sync {
    /// Newest first by `updated_at`.
    async fn list_letters(&self, user_id: Uuid) -> Result<Vec<Letter>, StoreError>;
    async fn insert_letter(&self, letter: NewLetter) -> Result<Letter, StoreError>;
    async fn update_letter(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Letter>, StoreError>;
    async fn delete_letter(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub trait RecordStore: CvStore + AccountStore + LetterStore {}

impl<T: CvStore + AccountStore + LetterStore> RecordStore for T {}
