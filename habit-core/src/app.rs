use ratatui::layout::Rect;
use tracing::error;

use crate::dates::today;
use crate::handlers::*;
use crate::heatmap::{HeatmapBoard, YearRange};
use crate::key_event::{AppClick, AppKeyCode, AppKeyEvent};
use crate::storage::KeyValueStorage;
use crate::store::{HabitStore, Repaint, StoreError};
use crate::types::*;
use crate::ui::log_modal_area;

/// Central application state, generic over the storage backend.
pub struct AppState<S> {
    pub store: HabitStore<S>,
    pub heatmaps: HeatmapBoard,
    pub range: YearRange,
    pub selected: usize,
    pub mode: Mode,
    pub focused_block: FocusedBlock,
    pub new_habit_input: TextInput,
    pub log_form: Option<LogForm>,
    pub status: Option<StatusMessage>,
}

impl<S: KeyValueStorage> AppState<S> {
    /// Loads the stored habits and paints every heatmap.
    pub fn new(storage: S) -> Self {
        let store = HabitStore::load(storage);
        let focused_block = if store.is_empty() {
            FocusedBlock::NewHabit
        } else {
            FocusedBlock::Habits
        };
        let mut state = Self {
            store,
            heatmaps: HeatmapBoard::new(),
            range: YearRange::current(),
            selected: 0,
            mode: Mode::View,
            focused_block,
            new_habit_input: TextInput::default(),
            log_form: None,
            status: None,
        };
        state.render_all();
        state
    }

    /// Rebuilds one heatmap instance per habit, in list order.
    pub fn render_all(&mut self) {
        self.range = YearRange::current();
        self.heatmaps.render_all(self.store.habits(), self.range);
        self.selected = self.selected.min(self.store.len().saturating_sub(1));
    }

    pub fn apply_repaint(&mut self, repaint: Repaint) {
        match repaint {
            Repaint::All => self.render_all(),
            Repaint::Habit(id) => {
                if let Some(habit) = self.store.habit(id) {
                    self.heatmaps.refresh(habit, self.range);
                }
            }
        }
    }

    /// Shows a store failure in the status line. Memory may now differ from
    /// what is persisted, so everything is repainted from memory.
    pub fn report_store_error(&mut self, err: StoreError) {
        error!(error = %err, "habit store operation failed");
        self.status = Some(StatusMessage::error(err.to_string()));
        self.render_all();
    }

    /// Opens the log modal for `habit_id`, or rebinds it if already open.
    pub fn show_log_modal(&mut self, habit_id: HabitId) {
        if matches!(self.mode, Mode::LogModal) {
            if let Some(form) = self.log_form.as_mut() {
                form.habit_id = habit_id;
                form.error = None;
                return;
            }
        }
        self.log_form = Some(LogForm::new(habit_id, today()));
        self.mode = Mode::LogModal;
    }

    pub fn close_log_modal(&mut self) {
        self.log_form = None;
        self.mode = Mode::View;
    }

    /// Dispatch a key event to the appropriate handler.
    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, key: AppKeyEvent) -> bool {
        if key.is_ctrl_c() {
            return true;
        }
        // A status message lasts until the next key press.
        self.status = None;
        match self.mode {
            Mode::LogModal => {
                handle_log_modal_key(self, &key);
                false
            }
            Mode::View => match self.focused_block {
                FocusedBlock::NewHabit => {
                    handle_new_habit_key(self, &key);
                    false
                }
                FocusedBlock::Habits => {
                    if key.code == AppKeyCode::Char('q') {
                        return true;
                    }
                    handle_view_key(self, &key);
                    false
                }
            },
        }
    }

    /// A click outside the modal body dismisses the modal.
    pub fn handle_click(&mut self, click: AppClick, screen: Rect) {
        if !matches!(self.mode, Mode::LogModal) {
            return;
        }
        let modal = log_modal_area(screen);
        if !crate::utils::rect_contains(modal, click.column, click.row) {
            self.close_log_modal();
        }
    }
}
