use std::{cell::RefCell, io, rc::Rc};

use chrono::Duration;
use habit_core::app::AppState;
use habit_core::dates::today;
use habit_core::key_event::{AppKeyCode, AppKeyEvent};
use habit_core::ui;
use ratzilla::{
    event::{KeyCode, KeyEvent},
    DomBackend, WebRenderer,
};

mod local_storage;

use local_storage::LocalStorage;

// ── Key event conversion ─────────────────────────────────────────────────

fn convert_key(key: &KeyEvent) -> AppKeyEvent {
    let code = match key.code {
        KeyCode::Char(c) => AppKeyCode::Char(c),
        KeyCode::Backspace => AppKeyCode::Backspace,
        KeyCode::Enter => AppKeyCode::Enter,
        KeyCode::Left => AppKeyCode::Left,
        KeyCode::Right => AppKeyCode::Right,
        KeyCode::Up => AppKeyCode::Up,
        KeyCode::Down => AppKeyCode::Down,
        KeyCode::Tab => {
            if key.shift {
                AppKeyCode::BackTab
            } else {
                AppKeyCode::Tab
            }
        }
        KeyCode::Delete => AppKeyCode::Delete,
        KeyCode::Home => AppKeyCode::Home,
        KeyCode::End => AppKeyCode::End,
        KeyCode::Esc => AppKeyCode::Esc,
        _ => AppKeyCode::Other,
    };
    AppKeyEvent {
        code,
        ctrl: key.ctrl,
        alt: key.alt,
        shift: key.shift,
    }
}

// ── Seed data (only when storage is empty) ───────────────────────────────

fn seed_if_empty(state: &mut AppState<LocalStorage>) {
    if !state.store.is_empty() {
        return;
    }

    let seeds: [(&str, &[(i64, i64)]); 3] = [
        ("Exercise", &[(0, 3), (1, 5), (2, 2), (4, 4), (7, 1)]),
        ("Read", &[(0, 2), (3, 3), (5, 5)]),
        ("Meditate", &[(1, 1), (2, 1), (6, 2)]),
    ];

    let today = today();
    for (name, days) in seeds {
        if let Err(err) = state.store.add_habit(name) {
            tracing::warn!(error = %err, "seeding habit failed");
            return;
        }
        let Some(id) = state.store.habits().last().map(|h| h.id) else {
            return;
        };
        for (days_ago, value) in days {
            let day = today - Duration::days(*days_ago);
            if let Err(err) = state.store.log_day(id, day, *value) {
                tracing::warn!(error = %err, "seeding log failed");
            }
        }
    }
    state.render_all();
}

// ── Main entry point ─────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let mut app_state = AppState::new(LocalStorage::open());
    seed_if_empty(&mut app_state);
    let state = Rc::new(RefCell::new(app_state));

    let backend = DomBackend::new()?;
    let terminal = ratzilla::ratatui::Terminal::new(backend)?;

    let state_key = Rc::clone(&state);
    terminal.on_key_event(move |key| {
        let mut s = state_key.borrow_mut();
        // Quitting means nothing in a browser tab.
        let _ = s.handle_key(convert_key(&key));
    });

    let state_draw = Rc::clone(&state);
    terminal.draw_web(move |f| {
        let s = state_draw.borrow();
        ui::ui(f, &s, "browser, saved in localStorage");
    });

    Ok(())
}
