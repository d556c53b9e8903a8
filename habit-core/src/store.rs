//! Habit list ownership and durability.
//!
//! [`HabitStore`] is the only place that mutates habits. Every successful
//! mutation re-serializes the whole list and writes it under [`STORAGE_KEY`]
//! before returning, then tells the caller what to repaint.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::dates::date_key;
use crate::storage::{KeyValueStorage, StorageError};
use crate::types::{Habit, HabitId, MAX_LOG_VALUE, MIN_LOG_VALUE};

/// Key under which the serialized habit list is stored.
pub const STORAGE_KEY: &str = "habits";

/// Errors returned by store mutations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Log value outside `0..=5`.
    #[error("value {0} is outside 0..=5")]
    ValueOutOfRange(i64),

    /// The habit list could not be encoded.
    #[error("failed to serialize habits: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The write to the storage backend failed. Not retried.
    #[error("failed to save habits: {0}")]
    Storage(#[from] StorageError),
}

/// What the view has to redraw after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repaint {
    All,
    Habit(HabitId),
}

pub fn serialize_habits(habits: &[Habit]) -> Result<String, serde_json::Error> {
    serde_json::to_string(habits)
}

pub fn deserialize_habits(raw: &str) -> Result<Vec<Habit>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Central habit state, generic over the storage backend.
#[derive(Debug)]
pub struct HabitStore<S> {
    storage: S,
    habits: Vec<Habit>,
    last_id: i64,
}

impl<S: KeyValueStorage> HabitStore<S> {
    /// Reads the stored list. Missing or unreadable data yields an empty list.
    pub fn load(storage: S) -> Self {
        let habits = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match deserialize_habits(&raw) {
                Ok(habits) => dedupe_ids(tidy_names(habits)),
                Err(err) => {
                    warn!(error = %err, "stored habits are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read stored habits, starting empty");
                Vec::new()
            }
        };
        let last_id = habits.iter().map(|h| h.id.0).max().unwrap_or(0);
        debug!(count = habits.len(), "loaded habits");
        Self {
            storage,
            habits,
            last_id,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn add_habit(&mut self, name: &str) -> Result<Option<Repaint>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let id = self.next_id(Utc::now().timestamp_millis());
        self.habits.push(Habit::new(id, name));
        debug!(%id, name, "added habit");
        self.save()?;
        Ok(Some(Repaint::All))
    }

    /// Upserts one day's value. Unknown ids are ignored.
    pub fn log_day(
        &mut self,
        habit_id: HabitId,
        day: NaiveDate,
        value: i64,
    ) -> Result<Option<Repaint>, StoreError> {
        if !(MIN_LOG_VALUE..=MAX_LOG_VALUE).contains(&value) {
            return Err(StoreError::ValueOutOfRange(value));
        }
        let Some(habit) = self.habits.iter_mut().find(|h| h.id == habit_id) else {
            debug!(%habit_id, "log for unknown habit ignored");
            return Ok(None);
        };
        habit.data.insert(day, value as u8);
        debug!(%habit_id, day = %date_key(day), value, "logged day");
        self.save()?;
        Ok(Some(Repaint::Habit(habit_id)))
    }

    pub fn delete_habit(&mut self, habit_id: HabitId) -> Result<Option<Repaint>, StoreError> {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != habit_id);
        if self.habits.len() == before {
            return Ok(None);
        }
        debug!(%habit_id, "deleted habit");
        self.save()?;
        Ok(Some(Repaint::All))
    }

    /// Writes the whole list with a single `set` call.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let raw = serialize_habits(&self.habits)?;
        if let Err(err) = self.storage.set(STORAGE_KEY, &raw) {
            error!(error = %err, "saving habits failed");
            return Err(err.into());
        }
        Ok(())
    }

    fn next_id(&mut self, now_ms: i64) -> HabitId {
        let Some(after_last) = self.last_id.checked_add(1) else {
            return self.smallest_unused_id();
        };
        let id = now_ms.max(after_last);
        self.last_id = id;
        HabitId(id)
    }

    /// Used once stored ids have reached `i64::MAX`.
    fn smallest_unused_id(&self) -> HabitId {
        let taken: HashSet<i64> = self.habits.iter().map(|h| h.id.0).collect();
        let id = (0..i64::MAX).find(|id| !taken.contains(id)).unwrap_or(0);
        warn!(id, "id space exhausted, reusing a free id");
        HabitId(id)
    }
}

/// Stored names get the same trimming as new ones. Blank names are dropped.
fn tidy_names(habits: Vec<Habit>) -> Vec<Habit> {
    habits
        .into_iter()
        .filter_map(|mut h| {
            let trimmed = h.name.trim();
            if trimmed.is_empty() {
                warn!(id = %h.id, "dropping habit with blank name");
                return None;
            }
            if trimmed.len() != h.name.len() {
                h.name = trimmed.to_string();
            }
            Some(h)
        })
        .collect()
}

fn dedupe_ids(habits: Vec<Habit>) -> Vec<Habit> {
    let mut seen = HashSet::new();
    habits
        .into_iter()
        .filter(|h| {
            let fresh = seen.insert(h.id);
            if !fresh {
                warn!(id = %h.id, "dropping habit with duplicate id");
            }
            fresh
        })
        .collect()
}
