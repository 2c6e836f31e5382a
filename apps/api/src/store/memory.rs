use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::account::{
    ParametersPatch, UserParameters, UserProfile, DEFAULT_LANGUAGE, DEFAULT_THEME,
};
use crate::models::cv::{
    ChildRows, Collection, CvChildren, CvUpdate, EducationRow, ExperienceRow, HobbyRow, NewCv,
    PersistedCv, SkillRow,
};
use crate::models::letter::{Letter, NewLetter};
use crate::store::{AccountStore, CvStore, LetterStore, StoreError};

/// A store operation that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertCv,
    UpdateCv,
    DeleteCv,
    DeleteChildren(Collection),
    InsertChildren(Collection),
    UpsertProfile,
}

#[derive(Default)]
struct Tables {
    cvs: HashMap<Uuid, PersistedCv>,
    skills: Vec<SkillRow>,
    experiences: Vec<ExperienceRow>,
    educations: Vec<EducationRow>,
    hobbies: Vec<HobbyRow>,
    profiles: HashMap<Uuid, UserProfile>,
    parameters: HashMap<Uuid, UserParameters>,
    letters: HashMap<Uuid, Letter>,
}

/// In-process record store with the same observable behavior as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failures: RwLock<HashSet<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `point` fail until `clear_failures`.
    pub async fn fail_on(&self, point: FailPoint) {
        self.failures.write().await.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Row counts per child table, across all CVs.
    pub async fn child_counts(&self) -> HashMap<Collection, usize> {
        let tables = self.tables.read().await;
        HashMap::from([
            (Collection::Skills, tables.skills.len()),
            (Collection::Experiences, tables.experiences.len()),
            (Collection::Educations, tables.educations.len()),
            (Collection::Hobbies, tables.hobbies.len()),
        ])
    }

    async fn check(&self, point: FailPoint, table: &'static str) -> Result<(), StoreError> {
        if self.failures.read().await.contains(&point) {
            return Err(StoreError::Rejected {
                operation: "write",
                table,
                message: format!("injected failure at {point:?}"),
            });
        }
        Ok(())
    }
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
    rows
}

#[async_trait]
impl CvStore for MemoryStore {
    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<PersistedCv>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .cvs
            .values()
            .filter(|cv| cv.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |cv| cv.updated_at))
    }

    async fn get_cv(&self, id: Uuid) -> Result<Option<PersistedCv>, StoreError> {
        Ok(self.tables.read().await.cvs.get(&id).cloned())
    }

    async fn insert_cv(&self, cv: NewCv) -> Result<PersistedCv, StoreError> {
        self.check(FailPoint::InsertCv, "cvs").await?;
        let now = Utc::now();
        let row = PersistedCv {
            id: Uuid::new_v4(),
            user_id: cv.user_id,
            title: cv.title,
            content: cv.content,
            status: cv.status.as_str().to_string(),
            summary: cv.summary,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.cvs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_cv(
        &self,
        id: Uuid,
        update: CvUpdate,
    ) -> Result<Option<PersistedCv>, StoreError> {
        self.check(FailPoint::UpdateCv, "cvs").await?;
        let mut tables = self.tables.write().await;
        Ok(tables.cvs.get_mut(&id).map(|row| {
            row.title = update.title;
            row.content = update.content;
            row.summary = update.summary;
            row.updated_at = update.updated_at;
            row.clone()
        }))
    }

    async fn delete_cv(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check(FailPoint::DeleteCv, "cvs").await?;
        Ok(self.tables.write().await.cvs.remove(&id).is_some())
    }

    async fn delete_children(
        &self,
        collection: Collection,
        cv_id: Uuid,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::DeleteChildren(collection), collection.table())
            .await?;
        let mut tables = self.tables.write().await;
        let removed = match collection {
            Collection::Skills => retain_other(&mut tables.skills, |r| r.cv_id != cv_id),
            Collection::Experiences => retain_other(&mut tables.experiences, |r| r.cv_id != cv_id),
            Collection::Educations => retain_other(&mut tables.educations, |r| r.cv_id != cv_id),
            Collection::Hobbies => retain_other(&mut tables.hobbies, |r| r.cv_id != cv_id),
        };
        Ok(removed as u64)
    }

    async fn insert_children(&self, cv_id: Uuid, rows: ChildRows) -> Result<(), StoreError> {
        let collection = rows.collection();
        self.check(FailPoint::InsertChildren(collection), collection.table())
            .await?;
        let mut tables = self.tables.write().await;
        match rows {
            ChildRows::Skills(rows) => tables.skills.extend(rows.into_iter().map(|r| SkillRow {
                id: Uuid::new_v4(),
                cv_id,
                sort_order: r.sort_order,
                name: r.name,
                level: r.level,
            })),
            ChildRows::Experiences(rows) => {
                tables
                    .experiences
                    .extend(rows.into_iter().map(|r| ExperienceRow {
                        id: Uuid::new_v4(),
                        cv_id,
                        sort_order: r.sort_order,
                        company: r.company,
                        position: r.position,
                        start_date: r.start_date,
                        end_date: r.end_date,
                        description: r.description,
                    }))
            }
            ChildRows::Educations(rows) => {
                tables
                    .educations
                    .extend(rows.into_iter().map(|r| EducationRow {
                        id: Uuid::new_v4(),
                        cv_id,
                        sort_order: r.sort_order,
                        school: r.school,
                        degree: r.degree,
                        start_date: r.start_date,
                        end_date: r.end_date,
                        description: r.description,
                    }))
            }
            ChildRows::Hobbies(rows) => tables.hobbies.extend(rows.into_iter().map(|r| HobbyRow {
                id: Uuid::new_v4(),
                cv_id,
                sort_order: r.sort_order,
                name: r.name,
                description: r.description,
            })),
        }
        Ok(())
    }

    async fn fetch_children(&self, cv_id: Uuid) -> Result<CvChildren, StoreError> {
        let tables = self.tables.read().await;
        let mut children = CvChildren {
            skills: owned_by(&tables.skills, |r| r.cv_id == cv_id),
            experiences: owned_by(&tables.experiences, |r| r.cv_id == cv_id),
            educations: owned_by(&tables.educations, |r| r.cv_id == cv_id),
            hobbies: owned_by(&tables.hobbies, |r| r.cv_id == cv_id),
        };
        children.skills.sort_by_key(|r| r.sort_order);
        children.experiences.sort_by_key(|r| r.sort_order);
        children.educations.sort_by_key(|r| r.sort_order);
        children.hobbies.sort_by_key(|r| r.sort_order);
        Ok(children)
    }
}

fn retain_other<T>(rows: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> usize {
    let before = rows.len();
    rows.retain(|r| keep(r));
    before - rows.len()
}

fn owned_by<T: Clone>(rows: &[T], belongs: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().filter(|r| belongs(r)).cloned().collect()
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        self.check(FailPoint::UpsertProfile, "profiles").await?;
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_parameters(&self, user_id: Uuid) -> Result<Option<UserParameters>, StoreError> {
        Ok(self.tables.read().await.parameters.get(&user_id).cloned())
    }

    async fn ensure_parameters(&self, user_id: Uuid) -> Result<UserParameters, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables.parameters.entry(user_id).or_insert_with(|| {
            let now = Utc::now();
            UserParameters {
                id: Uuid::new_v4(),
                user_id,
                notifications_email: true,
                notifications_updates: true,
                language: DEFAULT_LANGUAGE.to_string(),
                theme: DEFAULT_THEME.to_string(),
                created_at: now,
                updated_at: now,
            }
        });
        Ok(row.clone())
    }

    async fn update_parameters(
        &self,
        user_id: Uuid,
        patch: ParametersPatch,
    ) -> Result<Option<UserParameters>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.parameters.get_mut(&user_id).map(|row| {
            if let Some(v) = patch.notifications_email {
                row.notifications_email = v;
            }
            if let Some(v) = patch.notifications_updates {
                row.notifications_updates = v;
            }
            if let Some(v) = patch.language {
                row.language = v;
            }
            if let Some(v) = patch.theme {
                row.theme = v;
            }
            row.updated_at = Utc::now();
            row.clone()
        }))
    }
}

#[async_trait]
impl LetterStore for MemoryStore {
    async fn list_letters(&self, user_id: Uuid) -> Result<Vec<Letter>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .letters
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |l| l.updated_at))
    }

    async fn insert_letter(&self, letter: NewLetter) -> Result<Letter, StoreError> {
        let now = Utc::now();
        let row = Letter {
            id: Uuid::new_v4(),
            user_id: letter.user_id,
            title: letter.title,
            content: letter.content,
            letter_type: letter.letter_type,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.letters.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_letter(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Letter>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.letters.get_mut(&id).map(|row| {
            row.title = title;
            row.content = content;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete_letter(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.letters.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{CvStatus, NewHobby};

    fn new_cv(user_id: Uuid, title: &str) -> NewCv {
        NewCv {
            user_id,
            title: title.to_string(),
            content: serde_json::json!({}),
            status: CvStatus::Draft,
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_delete_children_only_touches_one_cv() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for cv_id in [a, b] {
            store
                .insert_children(
                    cv_id,
                    ChildRows::Hobbies(vec![NewHobby {
                        sort_order: 0,
                        name: "Chess".to_string(),
                        description: None,
                    }]),
                )
                .await
                .unwrap();
        }
        assert_eq!(store.delete_children(Collection::Hobbies, a).await.unwrap(), 1);
        assert!(store.fetch_children(a).await.unwrap().hobbies.is_empty());
        assert_eq!(store.fetch_children(b).await.unwrap().hobbies.len(), 1);
    }

    #[tokio::test]
    async fn test_list_cvs_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first = store.insert_cv(new_cv(user, "first")).await.unwrap();
        store.insert_cv(new_cv(user, "second")).await.unwrap();
        store
            .update_cv(
                first.id,
                CvUpdate {
                    title: "first, edited".to_string(),
                    content: serde_json::json!({}),
                    summary: None,
                    updated_at: Utc::now() + chrono::Duration::seconds(5),
                },
            )
            .await
            .unwrap();

        let titles: Vec<_> = store
            .list_cvs(user)
            .await
            .unwrap()
            .into_iter()
            .map(|cv| cv.title)
            .collect();
        assert_eq!(titles, vec!["first, edited", "second"]);
        assert!(store.list_cvs(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on(FailPoint::InsertCv).await;
        assert!(matches!(
            store.insert_cv(new_cv(Uuid::new_v4(), "x")).await,
            Err(StoreError::Rejected { table: "cvs", .. })
        ));
        store.clear_failures().await;
        assert!(store.insert_cv(new_cv(Uuid::new_v4(), "x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_parameters_defaults_then_patch() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert!(store.get_parameters(user).await.unwrap().is_none());
        let created = store.ensure_parameters(user).await.unwrap();
        assert_eq!(created.language, "fr");
        assert!(created.notifications_email);

        let again = store.ensure_parameters(user).await.unwrap();
        assert_eq!(again.id, created.id);

        let patched = store
            .update_parameters(
                user,
                ParametersPatch {
                    theme: Some("dark".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.theme, "dark");
        assert_eq!(patched.language, "fr");
    }
}
