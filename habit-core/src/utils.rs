use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use thiserror::Error;

use crate::app::AppState;
use crate::dates::parse_date_input;
use crate::style;
use crate::types::*;

/// Validation failures shown inside the log modal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a value between 0 and 5")]
    ValueOutOfRange,

    #[error("Please enter a date as YYYY-MM-DD")]
    InvalidDate,
}

pub fn parse_log_value(input: &str) -> Result<i64, InputError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| InputError::ValueOutOfRange)?;
    if (MIN_LOG_VALUE..=MAX_LOG_VALUE).contains(&value) {
        Ok(value)
    } else {
        Err(InputError::ValueOutOfRange)
    }
}

pub fn parse_log_date(input: &str) -> Result<chrono::NaiveDate, InputError> {
    parse_date_input(input).ok_or(InputError::InvalidDate)
}

pub fn is_dialog_open(mode: &Mode) -> bool {
    matches!(mode, Mode::LogModal)
}

pub fn get_block_style(
    current: FocusedBlock,
    target: FocusedBlock,
    mode: &Mode,
) -> ratatui::style::Style {
    use ratatui::style::Style;
    if !is_dialog_open(mode) && current == target {
        Style::default().fg(style::BLUE)
    } else {
        Style::default()
    }
}

pub fn get_dimmed_style(mode: &Mode) -> ratatui::style::Style {
    use ratatui::style::Style;
    if is_dialog_open(mode) {
        Style::default().fg(style::GRAY_DIM)
    } else {
        Style::default()
    }
}

pub fn centered_rect_fixed_height(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical_pad = r.height.saturating_sub(height) / 2;

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(vertical_pad),
            Constraint::Length(height),
            Constraint::Length(vertical_pad),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn rect_contains(area: Rect, column: u16, row: u16) -> bool {
    area.contains(Position::new(column, row))
}

/// First card index to draw so that `selected` stays on screen.
pub fn scroll_offset(selected: usize, visible: usize, total: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    selected
        .saturating_sub(visible - 1)
        .min(total - visible)
}

pub fn selected_habit_id<S>(state: &AppState<S>) -> Option<HabitId>
where
    S: crate::storage::KeyValueStorage,
{
    state
        .store
        .habits()
        .get(state.selected)
        .map(|habit| habit.id)
}
