use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::AppState;
use crate::dates::{format_day_label, parse_date_input};
use crate::heatmap::HEATMAP_HEIGHT;
use crate::storage::KeyValueStorage;
use crate::style;
use crate::types::*;
use crate::utils::*;

/// Card height: heatmap plus the two border rows.
pub const CARD_HEIGHT: u16 = HEATMAP_HEIGHT + 2;

const MODAL_HEIGHT: u16 = 8;

#[cfg(feature = "web")]
const HELP_TEXT: &str = "↑↓ move • Tab: switch focus";
#[cfg(not(feature = "web"))]
const HELP_TEXT: &str = "↑↓ move • Tab: switch focus • q: quit";

pub fn log_modal_area(screen: Rect) -> Rect {
    centered_rect_fixed_height(60, MODAL_HEIGHT, screen)
}

// ── Main UI ──────────────────────────────────────────────────────────────

/// Render the entire UI.
///
/// `header_text` is shown in the header title (e.g. where data is stored).
pub fn ui<S: KeyValueStorage>(f: &mut ratatui::Frame, state: &AppState<S>, header_text: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // New habit input
            Constraint::Min(5),    // Cards
            Constraint::Length(1), // Status / help
        ])
        .split(f.area());

    render_new_habit_input(f, state, chunks[0], header_text);
    render_cards(f, state, chunks[1]);
    render_status_line(f, state, chunks[2]);
    render_log_modal(f, state);
}

fn render_new_habit_input<S: KeyValueStorage>(
    f: &mut ratatui::Frame,
    state: &AppState<S>,
    area: Rect,
    header_text: &str,
) {
    let dimmed = get_dimmed_style(&state.mode);
    let is_active =
        state.focused_block == FocusedBlock::NewHabit && !is_dialog_open(&state.mode);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Habit Tracker - {header_text}"))
        .style(dimmed)
        .border_style(get_block_style(
            state.focused_block,
            FocusedBlock::NewHabit,
            &state.mode,
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let hint = if is_active { "  (Enter: add)" } else { "" };
    render_labeled_input(
        f,
        inner,
        "New habit: ",
        dimmed,
        &state.new_habit_input,
        is_active,
        hint,
    );
}

fn render_cards<S: KeyValueStorage>(f: &mut ratatui::Frame, state: &AppState<S>, area: Rect) {
    let dimmed = get_dimmed_style(&state.mode);
    let habits = state.store.habits();

    if habits.is_empty() {
        let empty = Paragraph::new("No habits yet. Type a name above and press Enter.")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Habits")
                    .style(dimmed),
            )
            .style(Style::default().fg(style::GRAY_DIM));
        f.render_widget(empty, area);
        return;
    }

    let visible = (area.height / CARD_HEIGHT).max(1) as usize;
    let offset = scroll_offset(state.selected, visible, habits.len());
    let shown: Vec<_> = habits.iter().enumerate().skip(offset).take(visible).collect();

    let mut constraints: Vec<Constraint> = shown
        .iter()
        .map(|_| Constraint::Length(CARD_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let list_focused =
        state.focused_block == FocusedBlock::Habits && !is_dialog_open(&state.mode);

    for (slot, (idx, habit)) in slots.iter().zip(shown) {
        let is_selected = idx == state.selected;
        let border_style = if is_selected && list_focused {
            Style::default().fg(style::BLUE)
        } else {
            dimmed
        };
        let name_style = if is_selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", habit.name), name_style))
            .style(dimmed)
            .border_style(border_style);
        if is_selected && list_focused {
            block = block.title(
                Line::from(Span::styled(
                    " l: Log • d: Delete ",
                    Style::default().fg(style::GRAY_DIM),
                ))
                .right_aligned(),
            );
        }

        let inner = block.inner(*slot);
        f.render_widget(block, *slot);
        if let Some(heatmap) = state.heatmaps.get(habit.id) {
            f.render_widget(heatmap, inner);
        }
    }
}

fn render_status_line<S: KeyValueStorage>(
    f: &mut ratatui::Frame,
    state: &AppState<S>,
    area: Rect,
) {
    let line = match &state.status {
        Some(StatusMessage {
            kind: StatusKind::Error,
            text,
        }) => Line::from(Span::styled(text.clone(), Style::default().fg(style::RED))),
        Some(StatusMessage {
            kind: StatusKind::Info,
            text,
        }) => Line::from(Span::styled(text.clone(), Style::default().fg(style::GRAY_DIM))),
        None => Line::from(Span::styled(
            format!("{} • {HELP_TEXT}", state.range.year()),
            Style::default().fg(style::GRAY_DIM),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

// ── Log modal ────────────────────────────────────────────────────────────

fn render_labeled_input(
    f: &mut ratatui::Frame,
    area: Rect,
    prefix: &str,
    field_style: Style,
    input: &TextInput,
    is_active: bool,
    hint: &str,
) {
    if area.height == 0 {
        return;
    }
    let line = Line::from(vec![
        Span::styled(prefix.to_string(), field_style),
        Span::styled(input.value.clone(), field_style),
        Span::styled(hint.to_string(), Style::default().fg(style::GRAY_DIM)),
    ]);
    f.render_widget(Paragraph::new(line), area);

    if is_active {
        let x = area.x + prefix.chars().count() as u16 + input.cursor as u16;
        f.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
    }
}

fn render_log_modal<S: KeyValueStorage>(f: &mut ratatui::Frame, state: &AppState<S>) {
    if !matches!(state.mode, Mode::LogModal) {
        return;
    }
    let Some(form) = &state.log_form else {
        return;
    };

    let area = log_modal_area(f.area());
    f.render_widget(Clear, area);

    let habit_name = state
        .store
        .habit(form.habit_id)
        .map(|h| h.name.as_str())
        .unwrap_or("?");
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Log {habit_name}"))
        .border_style(Style::default().fg(style::BLUE));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Date
            Constraint::Length(1), // Value
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Error
            Constraint::Min(0),    // Filler
            Constraint::Length(1), // Help
        ])
        .split(inner);

    let field_style = |field: LogField| {
        if form.current_field == field {
            Style::default().fg(style::BLUE)
        } else {
            Style::default()
        }
    };

    let date_hint = parse_date_input(&form.date.value)
        .map(|day| format!("  ({})", format_day_label(day)))
        .unwrap_or_default();
    render_labeled_input(
        f,
        layout[0],
        "Date:  ",
        field_style(LogField::Date),
        &form.date,
        form.current_field == LogField::Date,
        &date_hint,
    );
    render_labeled_input(
        f,
        layout[1],
        "Value: ",
        field_style(LogField::Value),
        &form.value,
        form.current_field == LogField::Value,
        "  (0-5)",
    );

    if let Some(error) = &form.error {
        f.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(style::RED)),
            layout[3],
        );
    }

    f.render_widget(
        Paragraph::new("Tab: switch field • Enter: log • Esc: cancel")
            .style(Style::default().fg(style::GRAY_DIM)),
        layout[5],
    );
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::storage::MemoryStorage;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(state: &AppState<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| ui(f, state, "memory")).unwrap();
        screen_text(&terminal)
    }

    #[test]
    fn empty_state_shows_hint() {
        let state = AppState::new(MemoryStorage::new());
        let text = draw(&state);
        assert!(text.contains("Habit Tracker - memory"));
        assert!(text.contains("No habits yet"));
    }

    #[test]
    fn cards_show_names_and_month_labels() {
        let mut state = AppState::new(MemoryStorage::new());
        state.store.add_habit("Exercise").unwrap();
        state.store.add_habit("Read").unwrap();
        state.render_all();

        let text = draw(&state);
        assert!(text.contains(" Exercise "));
        assert!(text.contains(" Read "));
        assert!(text.contains("Jan"));
    }

    #[test]
    fn modal_shows_error_message() {
        let mut state = AppState::new(MemoryStorage::new());
        state.store.add_habit("Exercise").unwrap();
        state.render_all();
        let id = state.store.habits()[0].id;
        state.show_log_modal(id);
        if let Some(form) = state.log_form.as_mut() {
            form.error = Some("Please enter a value between 0 and 5".to_string());
        }

        let text = draw(&state);
        assert!(text.contains("Log Exercise"));
        assert!(text.contains("Please enter a value between 0 and 5"));
    }

    #[test]
    fn help_line_returns_after_status_is_cleared() {
        let mut state = AppState::new(MemoryStorage::new());
        state.status = Some(StatusMessage::info("Added \"Read\""));
        assert!(draw(&state).contains("Added \"Read\""));

        state.handle_key(crate::key_event::AppKeyEvent::plain(
            crate::key_event::AppKeyCode::Tab,
        ));
        let text = draw(&state);
        assert!(!text.contains("Added \"Read\""));
        assert!(text.contains(HELP_TEXT));
    }
}
