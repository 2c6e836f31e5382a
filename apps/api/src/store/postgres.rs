use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
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

/// PostgreSQL-backed record store. Schema: `migrations/0001_init.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgStore {
    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<PersistedCv>, StoreError> {
        Ok(sqlx::query_as::<_, PersistedCv>(
            "SELECT * FROM cvs WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_cv(&self, id: Uuid) -> Result<Option<PersistedCv>, StoreError> {
        Ok(
            sqlx::query_as::<_, PersistedCv>("SELECT * FROM cvs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_cv(&self, cv: NewCv) -> Result<PersistedCv, StoreError> {
        Ok(sqlx::query_as::<_, PersistedCv>(
            r#"
            INSERT INTO cvs (id, user_id, title, content, status, summary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cv.user_id)
        .bind(&cv.title)
        .bind(&cv.content)
        .bind(cv.status.as_str())
        .bind(&cv.summary)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_cv(
        &self,
        id: Uuid,
        update: CvUpdate,
    ) -> Result<Option<PersistedCv>, StoreError> {
        Ok(sqlx::query_as::<_, PersistedCv>(
            r#"
            UPDATE cvs
            SET title = $2, content = $3, summary = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(&update.summary)
        .bind(update.updated_at)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_cv(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cvs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_children(
        &self,
        collection: Collection,
        cv_id: Uuid,
    ) -> Result<u64, StoreError> {
        // Table names come from a closed enum, never from input.
        let sql = format!("DELETE FROM {} WHERE cv_id = $1", collection.table());
        let result = sqlx::query(&sql).bind(cv_id).execute(&self.pool).await?;
        debug!(
            "Deleted {} rows from {} for cv {cv_id}",
            result.rows_affected(),
            collection
        );
        Ok(result.rows_affected())
    }

    async fn insert_children(&self, cv_id: Uuid, rows: ChildRows) -> Result<(), StoreError> {
        match rows {
            ChildRows::Skills(rows) => {
                for row in rows {
                    sqlx::query(
                        "INSERT INTO skills (id, cv_id, sort_order, name, level) VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(Uuid::new_v4())
                    .bind(cv_id)
                    .bind(row.sort_order)
                    .bind(&row.name)
                    .bind(row.level)
                    .execute(&self.pool)
                    .await?;
                }
            }
            ChildRows::Experiences(rows) => {
                for row in rows {
                    sqlx::query(
                        r#"
                        INSERT INTO experiences
                            (id, cv_id, sort_order, company, position, start_date, end_date, description)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(cv_id)
                    .bind(row.sort_order)
                    .bind(&row.company)
                    .bind(&row.position)
                    .bind(&row.start_date)
                    .bind(&row.end_date)
                    .bind(&row.description)
                    .execute(&self.pool)
                    .await?;
                }
            }
            ChildRows::Educations(rows) => {
                for row in rows {
                    sqlx::query(
                        r#"
                        INSERT INTO educations
                            (id, cv_id, sort_order, school, degree, start_date, end_date, description)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(cv_id)
                    .bind(row.sort_order)
                    .bind(&row.school)
                    .bind(&row.degree)
                    .bind(&row.start_date)
                    .bind(&row.end_date)
                    .bind(&row.description)
                    .execute(&self.pool)
                    .await?;
                }
            }
            ChildRows::Hobbies(rows) => {
                for row in rows {
                    sqlx::query(
                        "INSERT INTO hobbies (id, cv_id, sort_order, name, description) VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(Uuid::new_v4())
                    .bind(cv_id)
                    .bind(row.sort_order)
                    .bind(&row.name)
                    .bind(&row.description)
                    .execute(&self.pool)
                    .await?;
                }
            }
        }
        Ok(())
    }

    async fn fetch_children(&self, cv_id: Uuid) -> Result<CvChildren, StoreError> {
        let skills = sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills WHERE cv_id = $1 ORDER BY sort_order",
        )
        .bind(cv_id)
        .fetch_all(&self.pool)
        .await?;
        let experiences = sqlx::query_as::<_, ExperienceRow>(
            "SELECT * FROM experiences WHERE cv_id = $1 ORDER BY sort_order",
        )
        .bind(cv_id)
        .fetch_all(&self.pool)
        .await?;
        let educations = sqlx::query_as::<_, EducationRow>(
            "SELECT * FROM educations WHERE cv_id = $1 ORDER BY sort_order",
        )
        .bind(cv_id)
        .fetch_all(&self.pool)
        .await?;
        let hobbies = sqlx::query_as::<_, HobbyRow>(
            "SELECT * FROM hobbies WHERE cv_id = $1 ORDER BY sort_order",
        )
        .bind(cv_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CvChildren {
            skills,
            experiences,
            educations,
            hobbies,
        })
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(
            sqlx::query_as::<_, UserProfile>("SELECT * FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        Ok(sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO profiles (id, full_name, email, phone, address, summary, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                summary = EXCLUDED.summary,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.summary)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_parameters(&self, user_id: Uuid) -> Result<Option<UserParameters>, StoreError> {
        Ok(
            sqlx::query_as::<_, UserParameters>("SELECT * FROM parameters WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn ensure_parameters(&self, user_id: Uuid) -> Result<UserParameters, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO parameters
                (id, user_id, notifications_email, notifications_updates, language, theme)
            VALUES ($1, $2, TRUE, TRUE, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(DEFAULT_LANGUAGE)
        .bind(DEFAULT_THEME)
        .execute(&self.pool)
        .await?;

        Ok(
            sqlx::query_as::<_, UserParameters>("SELECT * FROM parameters WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn update_parameters(
        &self,
        user_id: Uuid,
        patch: ParametersPatch,
    ) -> Result<Option<UserParameters>, StoreError> {
        Ok(sqlx::query_as::<_, UserParameters>(
            r#"
            UPDATE parameters SET
                notifications_email = COALESCE($2, notifications_email),
                notifications_updates = COALESCE($3, notifications_updates),
                language = COALESCE($4, language),
                theme = COALESCE($5, theme),
                updated_at = $6
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(patch.notifications_email)
        .bind(patch.notifications_updates)
        .bind(&patch.language)
        .bind(&patch.theme)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl LetterStore for PgStore {
    async fn list_letters(&self, user_id: Uuid) -> Result<Vec<Letter>, StoreError> {
        Ok(sqlx::query_as::<_, Letter>(
            "SELECT * FROM letters WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_letter(&self, letter: NewLetter) -> Result<Letter, StoreError> {
        Ok(sqlx::query_as::<_, Letter>(
            r#"
            INSERT INTO letters (id, user_id, title, content, letter_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(letter.user_id)
        .bind(&letter.title)
        .bind(&letter.content)
        .bind(&letter.letter_type)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_letter(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Letter>, StoreError> {
        Ok(sqlx::query_as::<_, Letter>(
            r#"
            UPDATE letters SET title = $2, content = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&title)
        .bind(&content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_letter(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM letters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
