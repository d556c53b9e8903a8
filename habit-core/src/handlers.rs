use tracing::debug;

use crate::app::AppState;
use crate::key_event::{AppKeyCode, AppKeyEvent};
use crate::storage::KeyValueStorage;
use crate::types::*;
use crate::utils::{parse_log_date, parse_log_value, selected_habit_id};

pub fn handle_view_key<S: KeyValueStorage>(state: &mut AppState<S>, key: &AppKeyEvent) {
    match key.code {
        AppKeyCode::Char('q') => {} // Quit is handled by the caller
        AppKeyCode::Up | AppKeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
        }
        AppKeyCode::Down | AppKeyCode::Char('j') => {
            let max_idx = state.store.len().saturating_sub(1);
            state.selected = state.selected.saturating_add(1).min(max_idx);
        }
        AppKeyCode::Tab | AppKeyCode::BackTab | AppKeyCode::Char('a') => {
            state.focused_block = FocusedBlock::NewHabit;
        }
        AppKeyCode::Enter | AppKeyCode::Char('l') => {
            if let Some(habit_id) = selected_habit_id(state) {
                state.show_log_modal(habit_id);
            }
        }
        AppKeyCode::Delete | AppKeyCode::Char('d') => {
            if let Some(habit_id) = selected_habit_id(state) {
                delete_habit(state, habit_id);
            }
        }
        _ => {}
    }
}

pub fn handle_new_habit_key<S: KeyValueStorage>(state: &mut AppState<S>, key: &AppKeyEvent) {
    if state.new_habit_input.handle_key(key) {
        return;
    }
    match key.code {
        AppKeyCode::Tab | AppKeyCode::BackTab | AppKeyCode::Down | AppKeyCode::Esc => {
            if !state.store.is_empty() {
                state.focused_block = FocusedBlock::Habits;
            }
        }
        AppKeyCode::Enter => add_habit(state),
        _ => {}
    }
}

pub fn add_habit<S: KeyValueStorage>(state: &mut AppState<S>) {
    let name = state.new_habit_input.value.clone();
    match state.store.add_habit(&name) {
        Ok(Some(repaint)) => {
            state.new_habit_input.clear();
            state.selected = state.store.len().saturating_sub(1);
            state.status = Some(StatusMessage::info(format!("Added \"{}\"", name.trim())));
            state.apply_repaint(repaint);
        }
        Ok(None) => debug!("empty habit name ignored"),
        Err(err) => {
            state.new_habit_input.clear();
            state.selected = state.store.len().saturating_sub(1);
            state.report_store_error(err);
        }
    }
}

/// Deletes immediately; there is no confirmation step.
pub fn delete_habit<S: KeyValueStorage>(state: &mut AppState<S>, habit_id: HabitId) {
    let name = state.store.habit(habit_id).map(|h| h.name.clone());
    match state.store.delete_habit(habit_id) {
        Ok(Some(repaint)) => {
            if let Some(name) = name {
                state.status = Some(StatusMessage::info(format!("Deleted \"{name}\"")));
            }
            state.apply_repaint(repaint);
            if state.store.is_empty() {
                state.focused_block = FocusedBlock::NewHabit;
            }
        }
        Ok(None) => {}
        Err(err) => state.report_store_error(err),
    }
}

pub fn handle_log_modal_key<S: KeyValueStorage>(state: &mut AppState<S>, key: &AppKeyEvent) {
    let Some(form) = state.log_form.as_mut() else {
        state.mode = Mode::View;
        return;
    };

    if form.active_input().handle_key(key) {
        form.error = None;
        return;
    }

    match key.code {
        AppKeyCode::Esc => state.close_log_modal(),
        AppKeyCode::Tab | AppKeyCode::BackTab | AppKeyCode::Up | AppKeyCode::Down => {
            form.current_field = form.current_field.toggle();
        }
        AppKeyCode::Enter => submit_log(state),
        _ => {}
    }
}

/// Validates the modal fields and logs the day. Invalid input keeps the
/// modal open with a message.
pub fn submit_log<S: KeyValueStorage>(state: &mut AppState<S>) {
    let Some(form) = state.log_form.as_mut() else {
        return;
    };
    let parsed = parse_log_date(&form.date.value)
        .and_then(|day| parse_log_value(&form.value.value).map(|value| (day, value)));
    let (day, value) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            form.error = Some(err.to_string());
            return;
        }
    };
    let habit_id = form.habit_id;

    let result = state.store.log_day(habit_id, day, value);
    state.close_log_modal();
    match result {
        Ok(Some(repaint)) => state.apply_repaint(repaint),
        Ok(None) => debug!(%habit_id, "habit vanished before logging"),
        Err(err) => state.report_store_error(err),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dates::today;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::store::STORAGE_KEY;
    use crate::types::{StatusKind, StatusMessage};

    /// Serves one stored habit, refuses every write.
    struct FullStorage;

    impl KeyValueStorage for FullStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(Some(r#"[{"id":1,"name":"Exercise","data":{}}]"#.to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }
    }

    fn press(state: &mut AppState<MemoryStorage>, code: AppKeyCode) -> bool {
        state.handle_key(AppKeyEvent::plain(code))
    }

    fn type_text(state: &mut AppState<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(state, AppKeyCode::Char(c));
        }
    }

    fn clear_field(state: &mut AppState<MemoryStorage>) {
        press(state, AppKeyCode::End);
        for _ in 0..16 {
            press(state, AppKeyCode::Backspace);
        }
    }

    fn persisted(state: &AppState<MemoryStorage>) -> String {
        state.store.storage().get(STORAGE_KEY).unwrap().unwrap()
    }

    #[test]
    fn typing_name_and_enter_adds_habit() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "Exercise");
        press(&mut state, AppKeyCode::Enter);

        assert_eq!(state.store.len(), 1);
        assert_eq!(state.store.habits()[0].name, "Exercise");
        assert!(state.new_habit_input.value.is_empty());
        assert_eq!(state.heatmaps.len(), 1);
    }

    #[test]
    fn whitespace_name_keeps_input_and_list() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "   ");
        press(&mut state, AppKeyCode::Enter);

        assert!(state.store.is_empty());
        assert_eq!(state.new_habit_input.value, "   ");
    }

    #[test]
    fn log_modal_flow_upserts_and_closes() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "Exercise");
        press(&mut state, AppKeyCode::Enter);
        press(&mut state, AppKeyCode::Tab);
        assert_eq!(state.focused_block, FocusedBlock::Habits);

        press(&mut state, AppKeyCode::Char('l'));
        assert_eq!(state.mode, Mode::LogModal);

        // Value field is active first; switch to the date and overwrite it.
        press(&mut state, AppKeyCode::Tab);
        clear_field(&mut state);
        type_text(&mut state, "2024-03-01");
        press(&mut state, AppKeyCode::Tab);
        type_text(&mut state, "3");
        press(&mut state, AppKeyCode::Enter);

        assert_eq!(state.mode, Mode::View);
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(state.store.habits()[0].value_on(day), Some(3));
        assert!(persisted(&state).contains(r#""2024-03-01":3"#));
    }

    #[test]
    fn out_of_range_value_keeps_modal_open() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "Exercise");
        press(&mut state, AppKeyCode::Enter);
        press(&mut state, AppKeyCode::Tab);
        press(&mut state, AppKeyCode::Enter);

        type_text(&mut state, "6");
        press(&mut state, AppKeyCode::Enter);

        assert_eq!(state.mode, Mode::LogModal);
        let form = state.log_form.as_ref().unwrap();
        assert_eq!(
            form.error.as_deref(),
            Some("Please enter a value between 0 and 5")
        );
        assert!(state.store.habits()[0].data.is_empty());

        press(&mut state, AppKeyCode::Backspace);
        assert!(state.log_form.as_ref().unwrap().error.is_none());
        type_text(&mut state, "5");
        press(&mut state, AppKeyCode::Enter);
        assert_eq!(state.mode, Mode::View);
        assert_eq!(state.store.habits()[0].data.len(), 1);
    }

    #[test]
    fn esc_dismisses_without_logging() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "Exercise");
        press(&mut state, AppKeyCode::Enter);
        press(&mut state, AppKeyCode::Tab);
        press(&mut state, AppKeyCode::Enter);
        type_text(&mut state, "2");
        press(&mut state, AppKeyCode::Esc);

        assert_eq!(state.mode, Mode::View);
        assert!(state.store.habits()[0].data.is_empty());
    }

    #[test]
    fn delete_key_removes_selected_habit_and_persists() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "Exercise");
        press(&mut state, AppKeyCode::Enter);
        type_text(&mut state, "Read");
        press(&mut state, AppKeyCode::Enter);
        press(&mut state, AppKeyCode::Tab);

        assert_eq!(state.selected, 1);
        press(&mut state, AppKeyCode::Char('d'));
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.store.habits()[0].name, "Exercise");
        assert_eq!(state.selected, 0);

        press(&mut state, AppKeyCode::Delete);
        assert!(state.store.is_empty());
        assert_eq!(persisted(&state), "[]");
        assert_eq!(state.focused_block, FocusedBlock::NewHabit);
    }

    #[test]
    fn selection_is_clamped() {
        let mut state = AppState::new(MemoryStorage::new());
        type_text(&mut state, "A");
        press(&mut state, AppKeyCode::Enter);
        press(&mut state, AppKeyCode::Tab);

        press(&mut state, AppKeyCode::Down);
        press(&mut state, AppKeyCode::Down);
        assert_eq!(state.selected, 0);
        press(&mut state, AppKeyCode::Up);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn failed_save_closes_modal_and_reports_error() {
        let mut state = AppState::new(FullStorage);
        assert_eq!(state.focused_block, FocusedBlock::Habits);

        state.handle_key(AppKeyEvent::plain(AppKeyCode::Char('l')));
        state.handle_key(AppKeyEvent::plain(AppKeyCode::Char('3')));
        state.handle_key(AppKeyEvent::plain(AppKeyCode::Enter));

        assert_eq!(state.mode, Mode::View);
        assert!(state.log_form.is_none());
        match &state.status {
            Some(StatusMessage {
                kind: StatusKind::Error,
                text,
            }) => assert!(text.contains("quota exceeded")),
            other => panic!("expected an error status, got {other:?}"),
        }
        assert_eq!(state.store.habits()[0].value_on(today()), Some(3));
        let heatmap = state.heatmaps.get(HabitId(1)).unwrap();
        assert_eq!(heatmap.value_on(today()), Some(3));
    }
}
