pub mod app;
pub mod dates;
pub mod handlers;
pub mod heatmap;
pub mod key_event;
pub mod storage;
pub mod store;
pub mod style;
pub mod types;
pub mod ui;
pub mod utils;

pub use store::{HabitStore, Repaint, StoreError, STORAGE_KEY};
pub use types::{Habit, HabitId};
