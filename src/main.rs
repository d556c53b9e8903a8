use std::fs::{self, OpenOptions};
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::SetCursorStyle;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use habit_core::app::AppState;
use habit_core::key_event::{AppClick, AppKeyCode, AppKeyEvent};
use habit_core::storage::FileStorage;
use habit_core::ui;

const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "habit-cli.log";

// ── Key event conversion ─────────────────────────────────────────────────

fn convert_key(key: crossterm::event::KeyEvent) -> AppKeyEvent {
    let code = match key.code {
        KeyCode::Char(c) => AppKeyCode::Char(c),
        KeyCode::Backspace => AppKeyCode::Backspace,
        KeyCode::Enter => AppKeyCode::Enter,
        KeyCode::Left => AppKeyCode::Left,
        KeyCode::Right => AppKeyCode::Right,
        KeyCode::Up => AppKeyCode::Up,
        KeyCode::Down => AppKeyCode::Down,
        KeyCode::Tab => AppKeyCode::Tab,
        KeyCode::BackTab => AppKeyCode::BackTab,
        KeyCode::Delete => AppKeyCode::Delete,
        KeyCode::Home => AppKeyCode::Home,
        KeyCode::End => AppKeyCode::End,
        KeyCode::Esc => AppKeyCode::Esc,
        _ => AppKeyCode::Other,
    };
    AppKeyEvent {
        code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    }
}

// ── Config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CliConfig {
    data_dir: Option<PathBuf>,
    log_level: Option<String>,
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; please set HOME")?;
    Ok(Path::new(&home).join(".config/habit-cli/config.json"))
}

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; please set HOME")?;
    Ok(Path::new(&home).join(".local/share/habit-cli"))
}

/// A missing or unreadable config file is the same as an empty one.
fn load_config(path: &Path) -> CliConfig {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

fn persist_config(path: &Path, cfg: &CliConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let content = serde_json::to_string_pretty(cfg)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    Ok(())
}

/// Flag, then config file, then the default dir. The second value tells
/// whether the choice should be written back to the config file.
fn resolve_data_dir(
    preferred: Option<PathBuf>,
    cfg: &CliConfig,
    fallback: impl FnOnce() -> Result<PathBuf>,
) -> Result<(PathBuf, bool)> {
    if let Some(path) = preferred {
        return Ok((path, false));
    }
    if let Some(path) = &cfg.data_dir {
        return Ok((path.clone(), false));
    }
    Ok((fallback()?, true))
}

fn init_logging(data_dir: &Path, level: &str) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let log_path = data_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .init();
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "habit-cli")]
#[command(about = "Track daily habits with calendar heatmaps", long_about = None)]
struct Args {
    /// Directory holding habits.json and the log file
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg_path = config_path()?;
    let mut cfg = load_config(&cfg_path);

    let (data_dir, persist) = resolve_data_dir(args.data_dir.clone(), &cfg, default_data_dir)?;
    let level = args
        .log_level
        .clone()
        .or_else(|| cfg.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    init_logging(&data_dir, &level)?;

    if persist {
        cfg.data_dir = Some(data_dir.clone());
        persist_config(&cfg_path, &cfg).ok();
    }
    info!(data_dir = %data_dir.display(), "starting habit-cli");

    let mut app = AppState::new(FileStorage::new(&data_dir));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        event::EnableMouseCapture,
        SetCursorStyle::SteadyBlock
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &data_dir);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        terminal::LeaveAlternateScreen,
        event::DisableMouseCapture,
        SetCursorStyle::DefaultUserShape
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "habit-cli exited with an error");
        eprintln!("Error: {err}");
    }
    info!("habit-cli stopped");
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut AppState<FileStorage>,
    data_dir: &Path,
) -> Result<()> {
    let header = format!("data: {}", data_dir.display());
    loop {
        terminal.draw(|f| ui::ui(f, app, &header))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(convert_key(key)) {
                    break;
                }
            }
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    let size = terminal.size()?;
                    let screen = Rect::new(0, 0, size.width, size.height);
                    app.handle_click(
                        AppClick {
                            column: mouse.column,
                            row: mouse.row,
                        },
                        screen,
                    );
                }
            }
            _ => {}
        }
    }
    Ok(())
}
