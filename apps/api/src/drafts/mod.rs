//! Server-held edit sessions. Each draft owns one document behind its own lock, so
//! edits to the same draft are applied one at a time and never interleave.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::document::CvDocument;

#[derive(Debug, Clone)]
pub struct Draft {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Set once the draft has been saved; later saves update this CV.
    pub cv_id: Option<Uuid>,
    pub document: CvDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cv_id: Option<Uuid>,
    pub document: CvDocument,
}

impl From<&Draft> for DraftView {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id,
            user_id: draft.user_id,
            cv_id: draft.cv_id,
            document: draft.document.clone(),
        }
    }
}

pub type DraftHandle = Arc<Mutex<Draft>>;

struct Slot {
    draft: DraftHandle,
    touched: Instant,
}

/// Drafts idle for longer than the TTL are dropped the next time the store is used.
pub struct DraftStore {
    slots: RwLock<HashMap<Uuid, Slot>>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn open(
        &self,
        user_id: Uuid,
        cv_id: Option<Uuid>,
        mut document: CvDocument,
    ) -> DraftView {
        document.normalize();
        let draft = Draft {
            id: Uuid::new_v4(),
            user_id,
            cv_id,
            document,
        };
        let view = DraftView::from(&draft);

        let mut slots = self.slots.write().await;
        self.sweep_locked(&mut slots);
        slots.insert(
            draft.id,
            Slot {
                draft: Arc::new(Mutex::new(draft)),
                touched: Instant::now(),
            },
        );
        debug!("Opened draft {} for user {user_id}", view.id);
        view
    }

    /// Returns the draft and marks it as used.
    pub async fn get(&self, id: Uuid) -> Option<DraftHandle> {
        let mut slots = self.slots.write().await;
        self.sweep_locked(&mut slots);
        let slot = slots.get_mut(&id)?;
        slot.touched = Instant::now();
        Some(slot.draft.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.slots.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        let mut slots = self.slots.write().await;
        self.sweep_locked(&mut slots);
        slots.len()
    }

    fn sweep_locked(&self, slots: &mut HashMap<Uuid, Slot>) {
        let now = Instant::now();
        let before = slots.len();
        slots.retain(|_, slot| now.duration_since(slot.touched) <= self.ttl);
        let expired = before - slots.len();
        if expired > 0 {
            debug!("Expired {expired} idle drafts");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_normalizes_title() {
        let store = DraftStore::new(Duration::from_secs(60));
        let mut doc = CvDocument::new();
        doc.title = "  ".to_string();
        let view = store.open(Uuid::new_v4(), None, doc).await;
        assert_eq!(view.document.title, crate::document::PLACEHOLDER_TITLE);
        assert!(store.get(view.id).await.is_some());
    }

    #[tokio::test]
    async fn test_edits_through_handle_are_kept() {
        let store = DraftStore::new(Duration::from_secs(60));
        let view = store.open(Uuid::new_v4(), None, CvDocument::new()).await;

        let handle = store.get(view.id).await.unwrap();
        handle.lock().await.document.add_skill("Go");

        let again = store.get(view.id).await.unwrap();
        assert_eq!(again.lock().await.document.skills.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_drafts_expire() {
        let store = DraftStore::new(Duration::from_secs(60));
        let idle = store.open(Uuid::new_v4(), None, CvDocument::new()).await;
        let active = store.open(Uuid::new_v4(), None, CvDocument::new()).await;

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(store.get(active.id).await.is_some());
        tokio::time::advance(Duration::from_secs(40)).await;

        assert!(store.get(idle.id).await.is_none());
        assert!(store.get(active.id).await.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = DraftStore::new(Duration::from_secs(60));
        let view = store.open(Uuid::new_v4(), None, CvDocument::new()).await;
        assert!(store.remove(view.id).await);
        assert!(!store.remove(view.id).await);
        assert!(store.get(view.id).await.is_none());
    }
}
