//! Persistence synchronizer: makes the normalized tables match one CV document.
//!
//! Save:
//! 1. insert (new CV) or update (existing CV) the parent row with the full snapshot;
//!    this completes before anything else is written
//! 2. for each child table: delete every row of this CV, then insert one row per
//!    complete entry
//! 3. overwrite the user's profile with the document's personal info
//!
//! Steps 2 and 3 run as independent spawned tasks. The first failure observed fails
//! the save; tasks already running are left to finish. There is no transaction, so a
//! failed save can leave child tables half reconciled. Callers re-fetch and retry.

pub mod handlers;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{CvDocument, Education, Experience, Hobby, Skill, DEFAULT_SKILL_LEVEL};
use crate::models::account::{SessionUser, UserProfile};
use crate::models::cv::{
    ChildRows, Collection, CvChildren, CvStatus, CvUpdate, NewCv, NewEducation, NewExperience,
    NewHobby, NewSkill, PersistedCv,
};
use crate::store::{AccountStore, CvStore, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CV {0} not found")]
    NotFound(Uuid),

    #[error("Failed to read CV: {0}")]
    Read(#[source] StoreError),

    #[error("Failed to write parent record: {0}")]
    Parent(#[source] StoreError),

    #[error("Failed to clear {collection}: {source}")]
    Delete {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("Failed to insert {collection}: {source}")]
    Insert {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("Failed to update profile: {0}")]
    Profile(#[source] StoreError),

    #[error("Document snapshot could not be serialized: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Write task did not complete: {0}")]
    Task(String),
}

/// Result of a successful save: the parent row and how many child rows were written.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub cv: PersistedCv,
    pub skills: usize,
    pub experiences: usize,
    pub educations: usize,
    pub hobbies: usize,
    pub profile_updated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedCv {
    pub cv: PersistedCv,
    pub children: CvChildren,
}

/// Child rows derived from a document, incomplete entries already dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub skills: Vec<NewSkill>,
    pub experiences: Vec<NewExperience>,
    pub educations: Vec<NewEducation>,
    pub hobbies: Vec<NewHobby>,
}

impl Projection {
    pub fn into_rows(self) -> [ChildRows; 4] {
        [
            ChildRows::Skills(self.skills),
            ChildRows::Experiences(self.experiences),
            ChildRows::Educations(self.educations),
            ChildRows::Hobbies(self.hobbies),
        ]
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Projects the document onto the four child tables. `sort_order` is the entry's
/// rank among the entries that are kept.
pub fn project(document: &CvDocument) -> Projection {
    let skills = document
        .skills
        .iter()
        .enumerate()
        .map(|(i, skill)| NewSkill {
            sort_order: i as i32,
            name: skill.name.clone(),
            level: i16::from(skill.level),
        })
        .collect();

    let experiences = document
        .experience
        .iter()
        .filter(|e| {
            let keep = e.is_complete();
            if !keep {
                debug!("Skipping incomplete experience entry");
            }
            keep
        })
        .enumerate()
        .map(|(i, e)| NewExperience {
            sort_order: i as i32,
            company: e.company.clone(),
            position: e.position.clone(),
            start_date: blank_to_none(&e.start_date),
            end_date: blank_to_none(&e.end_date),
            description: blank_to_none(&e.description),
        })
        .collect();

    let educations = document
        .education
        .iter()
        .filter(|e| {
            let keep = e.is_complete();
            if !keep {
                debug!("Skipping incomplete education entry");
            }
            keep
        })
        .enumerate()
        .map(|(i, e)| NewEducation {
            sort_order: i as i32,
            school: e.school.clone(),
            degree: e.degree.clone(),
            start_date: blank_to_none(&e.start_date),
            end_date: blank_to_none(&e.end_date),
            description: blank_to_none(&e.description),
        })
        .collect();

    let hobbies = document
        .hobbies
        .iter()
        .filter(|h| {
            let keep = h.is_complete();
            if !keep {
                debug!("Skipping incomplete hobby entry");
            }
            keep
        })
        .enumerate()
        .map(|(i, h)| NewHobby {
            sort_order: i as i32,
            name: h.name.clone(),
            description: blank_to_none(&h.description),
        })
        .collect();

    Projection {
        skills,
        experiences,
        educations,
        hobbies,
    }
}

/// The profile a save writes, or `None` when the document carries no personal info.
/// A blank name or email falls back to the session identity.
fn profile_from(user: &SessionUser, document: &CvDocument) -> Option<UserProfile> {
    let personal = [
        &document.full_name,
        &document.email,
        &document.phone,
        &document.address,
        &document.summary,
    ];
    if personal.iter().all(|v| v.is_empty()) {
        return None;
    }
    Some(UserProfile {
        id: user.user_id,
        full_name: blank_to_none(&document.full_name).or_else(|| user.full_name.clone()),
        email: blank_to_none(&document.email).or_else(|| user.email.clone()),
        phone: blank_to_none(&document.phone),
        address: blank_to_none(&document.address),
        summary: blank_to_none(&document.summary),
        updated_at: Utc::now(),
    })
}

async fn settle<T>(handle: JoinHandle<Result<T, SyncError>>) -> Result<T, SyncError> {
    handle
        .await
        .map_err(|e| SyncError::Task(e.to_string()))?
}

async fn reconcile(
    store: Arc<dyn RecordStore>,
    cv_id: Uuid,
    rows: ChildRows,
) -> Result<usize, SyncError> {
    let collection = rows.collection();
    store
        .delete_children(collection, cv_id)
        .await
        .map_err(|source| SyncError::Delete { collection, source })?;

    let count = rows.len();
    if count > 0 {
        store
            .insert_children(cv_id, rows)
            .await
            .map_err(|source| SyncError::Insert { collection, source })?;
    }
    Ok(count)
}

/// Saves `document` for `user`. `existing_id` selects the update path; `None`
/// creates a new Draft CV.
pub async fn save_cv(
    store: Arc<dyn RecordStore>,
    user: &SessionUser,
    document: &CvDocument,
    existing_id: Option<Uuid>,
) -> Result<SaveOutcome, SyncError> {
    let mut document = document.clone();
    document.normalize();
    let content = serde_json::to_value(&document)?;
    let summary = blank_to_none(&document.summary);

    let cv = match existing_id {
        Some(id) => store
            .update_cv(
                id,
                CvUpdate {
                    title: document.title.clone(),
                    content,
                    summary,
                    updated_at: Utc::now(),
                },
            )
            .await
            .map_err(SyncError::Parent)?
            .ok_or(SyncError::NotFound(id))?,
        None => store
            .insert_cv(NewCv {
                user_id: user.user_id,
                title: document.title.clone(),
                content,
                status: CvStatus::Draft,
                summary,
            })
            .await
            .map_err(SyncError::Parent)?,
    };
    let cv_id = cv.id;

    let [skills, experiences, educations, hobbies] = project(&document)
        .into_rows()
        .map(|rows| tokio::spawn(reconcile(store.clone(), cv_id, rows)));

    let profile_task = profile_from(user, &document).map(|profile| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .upsert_profile(profile)
                .await
                .map(|_| ())
                .map_err(SyncError::Profile)
        })
    });

    let (skills, experiences, educations, hobbies, profile_updated) = tokio::try_join!(
        settle(skills),
        settle(experiences),
        settle(educations),
        settle(hobbies),
        async {
            match profile_task {
                Some(task) => settle(task).await.map(|()| true),
                None => Ok(false),
            }
        }
    )?;

    info!(
        "Saved CV {cv_id} for user {}: {skills} skills, {experiences} experiences, {educations} educations, {hobbies} hobbies",
        user.user_id
    );

    Ok(SaveOutcome {
        cv,
        skills,
        experiences,
        educations,
        hobbies,
        profile_updated,
    })
}

/// Deletes the four child collections, then the parent row.
pub async fn delete_cv(store: Arc<dyn RecordStore>, cv_id: Uuid) -> Result<(), SyncError> {
    if store.get_cv(cv_id).await.map_err(SyncError::Read)?.is_none() {
        return Err(SyncError::NotFound(cv_id));
    }

    let [skills, experiences, educations, hobbies] = Collection::ALL.map(|collection| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .delete_children(collection, cv_id)
                .await
                .map_err(|source| SyncError::Delete { collection, source })
        })
    });
    tokio::try_join!(
        settle(skills),
        settle(experiences),
        settle(educations),
        settle(hobbies)
    )?;

    if !store.delete_cv(cv_id).await.map_err(SyncError::Parent)? {
        return Err(SyncError::NotFound(cv_id));
    }
    info!("Deleted CV {cv_id}");
    Ok(())
}

pub async fn load_cv(store: &dyn RecordStore, cv_id: Uuid) -> Result<LoadedCv, SyncError> {
    let cv = store
        .get_cv(cv_id)
        .await
        .map_err(SyncError::Read)?
        .ok_or(SyncError::NotFound(cv_id))?;
    let children = store
        .fetch_children(cv_id)
        .await
        .map_err(SyncError::Read)?;
    Ok(LoadedCv { cv, children })
}

/// Rebuilds a document from the parent snapshot's scalar fields and the child rows.
/// Skill ids are taken from the snapshot where the row lines up with it.
pub fn reconstruct(loaded: &LoadedCv) -> CvDocument {
    let snapshot: CvDocument = serde_json::from_value(loaded.cv.content.clone())
        .unwrap_or_else(|_| CvDocument {
            title: loaded.cv.title.clone(),
            ..CvDocument::empty()
        });

    let mut skills = crate::document::EntryList::default();
    for (i, row) in loaded.children.skills.iter().enumerate() {
        let id = snapshot
            .skills
            .get(i)
            .filter(|s| s.name == row.name && !skills.contains_id(&s.id))
            .map(|s| s.id.clone())
            .unwrap_or_else(|| skills.fresh_id(Utc::now().timestamp_millis()));
        skills.add(Skill {
            id,
            name: row.name.clone(),
            level: u8::try_from(row.level).unwrap_or(DEFAULT_SKILL_LEVEL),
        });
    }

    let children = &loaded.children;
    CvDocument {
        skills,
        experience: children
            .experiences
            .iter()
            .map(|r| Experience {
                company: r.company.clone(),
                position: r.position.clone(),
                start_date: r.start_date.clone().unwrap_or_default(),
                end_date: r.end_date.clone().unwrap_or_default(),
                description: r.description.clone().unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .into(),
        education: children
            .educations
            .iter()
            .map(|r| Education {
                school: r.school.clone(),
                degree: r.degree.clone(),
                start_date: r.start_date.clone().unwrap_or_default(),
                end_date: r.end_date.clone().unwrap_or_default(),
                description: r.description.clone().unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .into(),
        hobbies: children
            .hobbies
            .iter()
            .map(|r| Hobby {
                name: r.name.clone(),
                description: r.description.clone().unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .into(),
        ..snapshot
    }
}

/// The document the editor should open for a stored CV: the snapshot as saved,
/// incomplete entries included. Falls back to the child rows if the snapshot no
/// longer parses.
pub fn editable_document(loaded: &LoadedCv) -> CvDocument {
    match serde_json::from_value::<CvDocument>(loaded.cv.content.clone()) {
        Ok(mut document) => {
            document.normalize();
            document
        }
        Err(e) => {
            warn!(
                "Snapshot of CV {} is unreadable, rebuilding from rows: {e}",
                loaded.cv.id
            );
            reconstruct(loaded)
        }
    }
}
