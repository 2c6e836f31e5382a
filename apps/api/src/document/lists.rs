//! Ordered child lists of a CV document and the edits the editor performs on them.
//!
//! Every operation here is synchronous and touches no I/O. Index-based edits fail
//! with `ListError::IndexOutOfRange` and leave the list untouched.

use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::document::Skill;

pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 5;
pub const DEFAULT_SKILL_LEVEL: u8 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListError {
    #[error("index {index} is out of range for a list of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no skill with id '{0}'")]
    UnknownSkill(String),

    #[error("skill level {0} is outside 1..=5")]
    LevelOutOfRange(u8),
}

/// A homogeneous, ordered list of entries. Serializes as a plain JSON array;
/// a missing or `null` array deserializes as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryList<T>(Vec<T>);

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for EntryList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Option::<Vec<T>>::deserialize(deserializer)?;
        Ok(Self(entries.unwrap_or_default()))
    }
}

impl<T> From<Vec<T>> for EntryList<T> {
    fn from(entries: Vec<T>) -> Self {
        Self(entries)
    }
}

impl<T> Deref for EntryList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> EntryList<T> {
    /// Appends `entry` after every existing entry.
    pub fn add(&mut self, entry: T) {
        self.0.push(entry);
    }

    /// Removes exactly one entry and closes the gap.
    pub fn remove_at(&mut self, index: usize) -> Result<T, ListError> {
        self.check(index)?;
        Ok(self.0.remove(index))
    }

    /// Array-move: the entry at `from` ends up at `to`, everything else keeps its
    /// relative order.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), ListError> {
        self.check(from)?;
        self.check(to)?;
        if from != to {
            let entry = self.0.remove(from);
            self.0.insert(to, entry);
        }
        Ok(())
    }

    /// Swaps in a new value for an existing entry, returning the old one.
    pub fn replace_at(&mut self, index: usize, entry: T) -> Result<T, ListError> {
        self.check(index)?;
        Ok(std::mem::replace(&mut self.0[index], entry))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, ListError> {
        self.check(index)?;
        Ok(&mut self.0[index])
    }

    fn check(&self, index: usize) -> Result<(), ListError> {
        if index < self.0.len() {
            Ok(())
        } else {
            Err(ListError::IndexOutOfRange {
                index,
                len: self.0.len(),
            })
        }
    }
}

impl EntryList<Skill> {
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|s| s.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Moves the skill `active_id` to the slot currently held by `over_id`.
    /// Dropping a skill onto itself changes nothing.
    pub fn move_by_id(&mut self, active_id: &str, over_id: &str) -> Result<(), ListError> {
        if active_id == over_id {
            return Ok(());
        }
        let from = self
            .position_of(active_id)
            .ok_or_else(|| ListError::UnknownSkill(active_id.to_string()))?;
        let to = self
            .position_of(over_id)
            .ok_or_else(|| ListError::UnknownSkill(over_id.to_string()))?;
        self.move_to(from, to)
    }

    pub fn set_level(&mut self, index: usize, level: u8) -> Result<(), ListError> {
        if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level) {
            return Err(ListError::LevelOutOfRange(level));
        }
        self.get_mut(index)?.level = level;
        Ok(())
    }

    /// Returns an id derived from `now_ms` that no skill in the list uses yet.
    /// Two skills created in the same millisecond get consecutive values.
    pub fn fresh_id(&self, now_ms: i64) -> String {
        let mut candidate = now_ms;
        loop {
            let id = candidate.to_string();
            if !self.contains_id(&id) {
                return id;
            }
            candidate += 1;
        }
    }
}
