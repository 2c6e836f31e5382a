//! The CV document being edited: scalar personal-info fields plus four ordered
//! child lists. This is also the exact shape stored as the `content` snapshot.

pub mod lists;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use lists::{EntryList, ListError, DEFAULT_SKILL_LEVEL};

/// Title used when the user leaves the title blank.
pub const PLACEHOLDER_TITLE: &str = "Nouveau CV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl Experience {
    pub fn is_complete(&self) -> bool {
        !self.company.is_empty() && !self.position.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl Education {
    pub fn is_complete(&self) -> bool {
        !self.school.is_empty() && !self.degree.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hobby {
    pub name: String,
    pub description: String,
}

impl Hobby {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: EntryList<Skill>,
    #[serde(default)]
    pub experience: EntryList<Experience>,
    #[serde(default)]
    pub education: EntryList<Education>,
    #[serde(default)]
    pub hobbies: EntryList<Hobby>,
}

/// Scalar fields addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CvField {
    Title,
    FullName,
    Email,
    Phone,
    Address,
    Summary,
}

/// Partial update of scalar fields; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvPatch {
    pub title: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub summary: Option<String>,
}

/// The list a list edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Skills,
    Experience,
    Education,
    Hobbies,
}

impl CvDocument {
    /// A blank document as the editor opens it: one empty experience, education
    /// and hobby block so there is always something to type into.
    pub fn new() -> Self {
        Self {
            title: PLACEHOLDER_TITLE.to_string(),
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            summary: String::new(),
            skills: EntryList::default(),
            experience: vec![Experience::default()].into(),
            education: vec![Education::default()].into(),
            hobbies: vec![Hobby::default()].into(),
        }
    }

    /// A document with the placeholder title and no entries at all.
    pub fn empty() -> Self {
        Self {
            experience: EntryList::default(),
            education: EntryList::default(),
            hobbies: EntryList::default(),
            ..Self::new()
        }
    }

    /// Replaces a blank title with the placeholder.
    pub fn normalize(&mut self) {
        if self.title.trim().is_empty() {
            self.title = PLACEHOLDER_TITLE.to_string();
        }
    }

    pub fn field(&self, field: CvField) -> &str {
        match field {
            CvField::Title => &self.title,
            CvField::FullName => &self.full_name,
            CvField::Email => &self.email,
            CvField::Phone => &self.phone,
            CvField::Address => &self.address,
            CvField::Summary => &self.summary,
        }
    }

    pub fn set_field(&mut self, field: CvField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CvField::Title => self.title = value,
            CvField::FullName => self.full_name = value,
            CvField::Email => self.email = value,
            CvField::Phone => self.phone = value,
            CvField::Address => self.address = value,
            CvField::Summary => self.summary = value,
        }
    }

    pub fn apply_patch(&mut self, patch: CvPatch) {
        let CvPatch {
            title,
            full_name,
            email,
            phone,
            address,
            summary,
        } = patch;
        let updates = [
            (CvField::Title, title),
            (CvField::FullName, full_name),
            (CvField::Email, email),
            (CvField::Phone, phone),
            (CvField::Address, address),
            (CvField::Summary, summary),
        ];
        for (field, value) in updates {
            if let Some(value) = value {
                self.set_field(field, value);
            }
        }
    }

    /// Adds a skill named `name` (trimmed) at the default level. A blank name adds
    /// nothing.
    pub fn add_skill(&mut self, name: &str) -> Option<&Skill> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = self
            .skills
            .fresh_id(chrono::Utc::now().timestamp_millis());
        self.skills.add(Skill {
            id,
            name: name.to_string(),
            level: DEFAULT_SKILL_LEVEL,
        });
        self.skills.last()
    }

    /// Appends a blank entry to a non-skill list. Skills need a name, see `add_skill`.
    pub fn add_blank(&mut self, kind: ListKind) {
        match kind {
            ListKind::Skills => {}
            ListKind::Experience => self.experience.add(Experience::default()),
            ListKind::Education => self.education.add(Education::default()),
            ListKind::Hobbies => self.hobbies.add(Hobby::default()),
        }
    }

    pub fn remove_at(&mut self, kind: ListKind, index: usize) -> Result<(), ListError> {
        match kind {
            ListKind::Skills => self.skills.remove_at(index).map(drop),
            ListKind::Experience => self.experience.remove_at(index).map(drop),
            ListKind::Education => self.education.remove_at(index).map(drop),
            ListKind::Hobbies => self.hobbies.remove_at(index).map(drop),
        }
    }

    pub fn move_to(&mut self, kind: ListKind, from: usize, to: usize) -> Result<(), ListError> {
        match kind {
            ListKind::Skills => self.skills.move_to(from, to),
            ListKind::Experience => self.experience.move_to(from, to),
            ListKind::Education => self.education.move_to(from, to),
            ListKind::Hobbies => self.hobbies.move_to(from, to),
        }
    }
}

impl Default for CvDocument {
    fn default() -> Self {
        Self::new()
    }
}
