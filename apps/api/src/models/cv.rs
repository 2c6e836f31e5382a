use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvStatus {
    Draft,
    Published,
}

impl CvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CvStatus::Draft => "draft",
            CvStatus::Published => "published",
        }
    }
}

/// Parent record. `content` is the full document snapshot; the child tables are a
/// queryable projection of it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersistedCv {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: Value,
    pub status: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCv {
    pub user_id: Uuid,
    pub title: String,
    pub content: Value,
    pub status: CvStatus,
    pub summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CvUpdate {
    pub title: String,
    pub content: Value,
    pub summary: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The four child tables owned by a CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Skills,
    Experiences,
    Educations,
    Hobbies,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Skills,
        Collection::Experiences,
        Collection::Educations,
        Collection::Hobbies,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Collection::Skills => "skills",
            Collection::Experiences => "experiences",
            Collection::Educations => "educations",
            Collection::Hobbies => "hobbies",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub sort_order: i32,
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub sort_order: i32,
    pub school: String,
    pub degree: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HobbyRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    pub sort_order: i32,
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExperience {
    pub sort_order: i32,
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEducation {
    pub sort_order: i32,
    pub school: String,
    pub degree: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHobby {
    pub sort_order: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Rows to insert into exactly one child table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRows {
    Skills(Vec<NewSkill>),
    Experiences(Vec<NewExperience>),
    Educations(Vec<NewEducation>),
    Hobbies(Vec<NewHobby>),
}

impl ChildRows {
    pub fn collection(&self) -> Collection {
        match self {
            ChildRows::Skills(_) => Collection::Skills,
            ChildRows::Experiences(_) => Collection::Experiences,
            ChildRows::Educations(_) => Collection::Educations,
            ChildRows::Hobbies(_) => Collection::Hobbies,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChildRows::Skills(rows) => rows.len(),
            ChildRows::Experiences(rows) => rows.len(),
            ChildRows::Educations(rows) => rows.len(),
            ChildRows::Hobbies(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every child row of one CV, each collection ordered by `sort_order`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CvChildren {
    pub skills: Vec<SkillRow>,
    pub experiences: Vec<ExperienceRow>,
    pub educations: Vec<EducationRow>,
    pub hobbies: Vec<HobbyRow>,
}
