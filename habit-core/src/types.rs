use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{date_key, day_map};
use crate::key_event::{AppKeyCode, AppKeyEvent};

pub const MIN_LOG_VALUE: i64 = 0;
pub const MAX_LOG_VALUE: i64 = 5;

// ── Habits ───────────────────────────────────────────────────────────────

/// Creation timestamp in milliseconds, unique within a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub i64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(with = "day_map", default)]
    pub data: BTreeMap<NaiveDate, u8>,
}

impl Habit {
    pub fn new(id: HabitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn value_on(&self, day: NaiveDate) -> Option<u8> {
        self.data.get(&day).copied()
    }

    /// `data` as `(YYYY-MM-DD, value)` pairs, oldest first.
    pub fn entries(&self) -> Vec<(String, u8)> {
        self.data
            .iter()
            .map(|(day, value)| (date_key(*day), *value))
            .collect()
    }
}

// ── Single-line text input ───────────────────────────────────────────────

/// Minimal single-line editor; `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn from_string(value: String) -> Self {
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: &AppKeyEvent) -> bool {
        if key.ctrl || key.alt {
            return false;
        }
        let len = self.value.chars().count();
        match key.code {
            AppKeyCode::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
            }
            AppKeyCode::Backspace => {
                if self.cursor > 0 {
                    let at = self.byte_index(self.cursor - 1);
                    self.value.remove(at);
                    self.cursor -= 1;
                }
            }
            AppKeyCode::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            AppKeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            AppKeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            AppKeyCode::Home => self.cursor = 0,
            AppKeyCode::End => self.cursor = len,
            _ => return false,
        }
        true
    }
}

// ── View state ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    View,
    LogModal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedBlock {
    NewHabit,
    #[default]
    Habits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogField {
    #[default]
    Date,
    Value,
}

impl LogField {
    pub fn toggle(self) -> Self {
        match self {
            LogField::Date => LogField::Value,
            LogField::Value => LogField::Date,
        }
    }
}

/// Contents of the log modal, bound to one habit.
#[derive(Debug, Clone)]
pub struct LogForm {
    pub habit_id: HabitId,
    pub date: TextInput,
    pub value: TextInput,
    pub current_field: LogField,
    pub error: Option<String>,
}

impl LogForm {
    pub fn new(habit_id: HabitId, day: NaiveDate) -> Self {
        Self {
            habit_id,
            date: TextInput::from_string(date_key(day)),
            value: TextInput::default(),
            current_field: LogField::Value,
            error: None,
        }
    }

    pub fn active_input(&mut self) -> &mut TextInput {
        match self.current_field {
            LogField::Date => &mut self.date,
            LogField::Value => &mut self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: AppKeyCode) -> AppKeyEvent {
        AppKeyEvent::plain(code)
    }

    #[test]
    fn habit_serializes_to_storage_shape() {
        let mut habit = Habit::new(HabitId(1_709_251_200_000), "Exercise");
        habit
            .data
            .insert(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 3);

        let json = serde_json::to_string(&habit).unwrap();
        assert_eq!(
            json,
            r#"{"id":1709251200000,"name":"Exercise","data":{"2024-03-01":3}}"#
        );
    }

    #[test]
    fn habit_without_data_field_loads_empty() {
        let habit: Habit = serde_json::from_str(r#"{"id":7,"name":"Read"}"#).unwrap();
        assert!(habit.data.is_empty());
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::from_string("ac".to_string());
        assert!(input.handle_key(&key(AppKeyCode::Left)));
        assert!(input.handle_key(&key(AppKeyCode::Char('b'))));
        assert_eq!(input.value, "abc");
        assert_eq!(input.cursor, 2);

        input.handle_key(&key(AppKeyCode::End));
        input.handle_key(&key(AppKeyCode::Backspace));
        assert_eq!(input.value, "ab");

        input.handle_key(&key(AppKeyCode::Home));
        input.handle_key(&key(AppKeyCode::Delete));
        assert_eq!(input.value, "b");
        assert!(!input.handle_key(&key(AppKeyCode::Enter)));
    }

    #[test]
    fn text_input_handles_multibyte_chars() {
        let mut input = TextInput::from_string("día".to_string());
        input.handle_key(&key(AppKeyCode::Backspace));
        input.handle_key(&key(AppKeyCode::Backspace));
        assert_eq!(input.value, "d");
        assert_eq!(input.cursor, 1);
    }

    #[test]
    fn log_form_starts_on_value_with_date_prefilled() {
        let form = LogForm::new(HabitId(1), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(form.date.value, "2024-03-01");
        assert_eq!(form.current_field, LogField::Value);
        assert!(form.error.is_none());
    }
}
