//! Calendar heatmap widget and the per-habit instance registry.
//!
//! A [`CalHeatmap`] is driven only through [`CalHeatmap::initialize`] and
//! [`CalHeatmap::destroy`]. When a habit's data changes its instance is
//! destroyed and built again from the full dataset; there is no incremental
//! update path.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;
use tracing::debug;

use crate::dates::{day_from_timestamp, day_timestamp, first_of_year, last_of_year, today};
use crate::style;
use crate::types::{Habit, HabitId};

/// Rows used by a painted heatmap: month labels plus seven weekdays.
pub const HEATMAP_HEIGHT: u16 = 8;
const GUTTER: u16 = 4;
const WEEK_COLUMNS: u16 = 54;
const CELL_SYMBOL: &str = "■";

/// One logged day as handed to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapRecord {
    /// Unix seconds of the day's UTC midnight.
    pub date: i64,
    pub value: u8,
}

pub fn records_for(habit: &Habit) -> Vec<HeatmapRecord> {
    habit
        .data
        .iter()
        .map(|(day, value)| HeatmapRecord {
            date: day_timestamp(*day),
            value: *value,
        })
        .collect()
}

pub fn mount_selector(habit_id: HabitId) -> String {
    format!("#heatmap-{habit_id}")
}

// ── Range & scale ────────────────────────────────────────────────────────

/// Inclusive day range shown by a heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl YearRange {
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self {
            start: first_of_year(year)?,
            end: last_of_year(year)?,
        })
    }

    /// January 1 through December 31 of the year containing `day`.
    pub fn containing(day: NaiveDate) -> Self {
        Self::for_year(day.year()).unwrap_or(Self {
            start: day,
            end: day,
        })
    }

    pub fn current() -> Self {
        Self::containing(today())
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Threshold scale: values at or above `thresholds[i]` use `steps[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScale {
    pub baseline: Color,
    pub steps: [Color; 5],
    pub thresholds: [u8; 5],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            baseline: style::HEAT_BASELINE,
            steps: style::HEAT_STEPS,
            thresholds: [1, 2, 3, 4, 5],
        }
    }
}

impl ColorScale {
    /// 0 for no activity, otherwise 1..=5.
    pub fn bucket(&self, value: Option<u8>) -> usize {
        match value {
            Some(v) => self.thresholds.iter().filter(|t| v >= **t).count(),
            None => 0,
        }
    }

    pub fn color_for(&self, value: Option<u8>) -> Color {
        match self.bucket(value) {
            0 => self.baseline,
            n => self.steps[n - 1],
        }
    }
}

// ── Widget ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Painted {
    mount: String,
    range: YearRange,
    scale: ColorScale,
    cells: BTreeMap<NaiveDate, u8>,
}

#[derive(Debug, Clone, Default)]
pub struct CalHeatmap {
    painted: Option<Painted>,
}

impl CalHeatmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the widget's state from `dataset`. Days outside `range` are
    /// dropped; repeated days keep the largest value.
    pub fn initialize(
        &mut self,
        mount: &str,
        range: YearRange,
        scale: ColorScale,
        dataset: &[HeatmapRecord],
    ) {
        let mut cells: BTreeMap<NaiveDate, u8> = BTreeMap::new();
        for record in dataset {
            let Some(day) = day_from_timestamp(record.date) else {
                continue;
            };
            if !range.contains(day) {
                continue;
            }
            let slot = cells.entry(day).or_insert(record.value);
            *slot = (*slot).max(record.value);
        }
        debug!(mount, points = cells.len(), "heatmap initialized");
        self.painted = Some(Painted {
            mount: mount.to_string(),
            range,
            scale,
            cells,
        });
    }

    pub fn destroy(&mut self) {
        if let Some(painted) = self.painted.take() {
            debug!(mount = %painted.mount, "heatmap destroyed");
        }
    }

    pub fn is_painted(&self) -> bool {
        self.painted.is_some()
    }

    pub fn mount(&self) -> Option<&str> {
        self.painted.as_ref().map(|p| p.mount.as_str())
    }

    pub fn range(&self) -> Option<YearRange> {
        self.painted.as_ref().map(|p| p.range)
    }

    pub fn value_on(&self, day: NaiveDate) -> Option<u8> {
        self.painted
            .as_ref()
            .and_then(|p| p.cells.get(&day).copied())
    }
}

/// Week column and weekday row (Sunday = 0) of `day` in a grid whose first
/// column holds `start`.
pub fn grid_position(start: NaiveDate, day: NaiveDate) -> (u16, u16) {
    let offset = start.weekday().num_days_from_sunday() as i64;
    let index = (day - start).num_days() + offset;
    let row = day.weekday().num_days_from_sunday() as u16;
    ((index / 7) as u16, row)
}

impl Widget for &CalHeatmap {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(painted) = &self.painted else {
            return;
        };
        if area.width <= GUTTER || area.height < 2 {
            return;
        }

        let cell_width = if area.width >= GUTTER + WEEK_COLUMNS * 2 {
            2
        } else {
            1
        };
        let dim = Style::default().fg(style::GRAY_DIM);
        let start = painted.range.start;

        for (row, label) in [(1u16, "Mon"), (3, "Wed"), (5, "Fri")] {
            let y = area.y + 1 + row;
            if y < area.bottom() {
                buf.set_string(area.x, y, label, dim);
            }
        }

        let mut next_free_x = area.x + GUTTER;
        for month in 1..=12 {
            let Some(first) = NaiveDate::from_ymd_opt(painted.range.year(), month, 1) else {
                continue;
            };
            if !painted.range.contains(first) {
                continue;
            }
            let (col, _) = grid_position(start, first);
            let x = (area.x + GUTTER + col * cell_width).max(next_free_x);
            let label = first.format("%b").to_string();
            if x + label.len() as u16 > area.right() {
                break;
            }
            buf.set_string(x, area.y, &label, dim);
            next_free_x = x + label.len() as u16 + 1;
        }

        for day in start.iter_days().take_while(|d| *d <= painted.range.end) {
            let (col, row) = grid_position(start, day);
            let x = area.x + GUTTER + col * cell_width;
            let y = area.y + 1 + row;
            if x >= area.right() || y >= area.bottom() {
                continue;
            }
            let color = painted.scale.color_for(painted.cells.get(&day).copied());
            buf.set_string(x, y, CELL_SYMBOL, Style::default().fg(color));
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

/// One widget instance per habit, keyed by habit id.
#[derive(Debug, Default)]
pub struct HeatmapBoard {
    instances: HashMap<HabitId, CalHeatmap>,
    scale: ColorScale,
}

impl HeatmapBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every instance and initializes one per habit.
    pub fn render_all(&mut self, habits: &[Habit], range: YearRange) {
        for instance in self.instances.values_mut() {
            instance.destroy();
        }
        self.instances.clear();
        for habit in habits {
            let instance = self.build(habit, range);
            self.instances.insert(habit.id, instance);
        }
    }

    /// Destroys and recreates the instance for one habit.
    pub fn refresh(&mut self, habit: &Habit, range: YearRange) {
        if let Some(old) = self.instances.get_mut(&habit.id) {
            old.destroy();
        }
        let fresh = self.build(habit, range);
        self.instances.insert(habit.id, fresh);
    }

    pub fn get(&self, habit_id: HabitId) -> Option<&CalHeatmap> {
        self.instances.get(&habit_id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn build(&self, habit: &Habit, range: YearRange) -> CalHeatmap {
        let mut instance = CalHeatmap::new();
        instance.initialize(
            &mount_selector(habit.id),
            range,
            self.scale,
            &records_for(habit),
        );
        instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn habit_with(id: i64, days: &[(NaiveDate, u8)]) -> Habit {
        let mut habit = Habit::new(HabitId(id), "Exercise");
        habit.data.extend(days.iter().copied());
        habit
    }

    #[test]
    fn records_use_utc_midnight_seconds() {
        let habit = habit_with(1, &[(d(2024, 3, 1), 3)]);
        assert_eq!(
            records_for(&habit),
            vec![HeatmapRecord {
                date: 1_709_251_200,
                value: 3
            }]
        );
    }

    #[test]
    fn year_range_spans_calendar_year() {
        let range = YearRange::containing(d(2024, 6, 15));
        assert_eq!(range.start, d(2024, 1, 1));
        assert_eq!(range.end, d(2024, 12, 31));
        assert!(!range.contains(d(2025, 1, 1)));
    }

    #[test]
    fn scale_buckets_follow_thresholds() {
        let scale = ColorScale::default();
        assert_eq!(scale.bucket(None), 0);
        assert_eq!(scale.bucket(Some(0)), 0);
        for v in 1..=5u8 {
            assert_eq!(scale.bucket(Some(v)), v as usize);
        }
        assert_eq!(scale.color_for(Some(0)), style::HEAT_BASELINE);
        assert_eq!(scale.color_for(Some(5)), style::HEAT_STEPS[4]);
    }

    #[test]
    fn initialize_filters_range_and_groups_by_max() {
        let range = YearRange::containing(d(2024, 1, 1));
        let march = day_timestamp(d(2024, 3, 1));
        let dataset = [
            HeatmapRecord { date: march, value: 2 },
            HeatmapRecord { date: march + 3_600, value: 4 },
            HeatmapRecord { date: day_timestamp(d(2023, 12, 31)), value: 5 },
        ];

        let mut cal = CalHeatmap::new();
        cal.initialize("#heatmap-1", range, ColorScale::default(), &dataset);

        assert_eq!(cal.mount(), Some("#heatmap-1"));
        assert_eq!(cal.value_on(d(2024, 3, 1)), Some(4));
        assert_eq!(cal.value_on(d(2023, 12, 31)), None);

        cal.destroy();
        assert!(!cal.is_painted());
        assert_eq!(cal.value_on(d(2024, 3, 1)), None);
    }

    #[test]
    fn grid_position_is_sunday_first_week_columns() {
        // 2024-01-01 is a Monday.
        let start = d(2024, 1, 1);
        assert_eq!(grid_position(start, start), (0, 1));
        assert_eq!(grid_position(start, d(2024, 1, 6)), (0, 6));
        assert_eq!(grid_position(start, d(2024, 1, 7)), (1, 0));
        assert_eq!(grid_position(start, d(2024, 12, 31)), (52, 2));
    }

    #[test]
    fn render_paints_logged_cells_with_scale_colors() {
        let range = YearRange::containing(d(2024, 1, 1));
        let habit = habit_with(1, &[(d(2024, 1, 7), 5)]);
        let mut cal = CalHeatmap::new();
        cal.initialize("#heatmap-1", range, ColorScale::default(), &records_for(&habit));

        let area = Rect::new(0, 0, GUTTER + WEEK_COLUMNS * 2, HEATMAP_HEIGHT);
        let mut buf = Buffer::empty(area);
        (&cal).render(area, &mut buf);

        // Jan 7 sits in week column 1, Sunday row.
        let logged = &buf[(GUTTER + 2, 1)];
        assert_eq!(logged.symbol(), CELL_SYMBOL);
        assert_eq!(logged.fg, style::HEAT_STEPS[4]);

        let empty = &buf[(GUTTER, 2)];
        assert_eq!(empty.symbol(), CELL_SYMBOL);
        assert_eq!(empty.fg, style::HEAT_BASELINE);

        assert_eq!(buf[(GUTTER, 0)].symbol(), "J");
        assert_eq!(buf[(0, 2)].symbol(), "M");
    }

    #[test]
    fn destroyed_widget_renders_nothing() {
        let mut cal = CalHeatmap::new();
        cal.initialize(
            "#heatmap-1",
            YearRange::containing(d(2024, 1, 1)),
            ColorScale::default(),
            &[],
        );
        cal.destroy();

        let area = Rect::new(0, 0, 60, HEATMAP_HEIGHT);
        let mut buf = Buffer::empty(area);
        (&cal).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }

    #[test]
    fn board_refresh_rebuilds_one_instance() {
        let range = YearRange::containing(d(2024, 1, 1));
        let mut first = habit_with(1, &[]);
        let second = habit_with(2, &[(d(2024, 2, 2), 1)]);

        let mut board = HeatmapBoard::new();
        board.render_all(&[first.clone(), second.clone()], range);
        assert_eq!(board.len(), 2);

        first.data.insert(d(2024, 3, 1), 3);
        board.refresh(&first, range);

        assert_eq!(board.get(first.id).unwrap().value_on(d(2024, 3, 1)), Some(3));
        assert_eq!(board.get(second.id).unwrap().value_on(d(2024, 2, 2)), Some(1));

        board.render_all(&[second], range);
        assert!(board.get(first.id).is_none());
        assert_eq!(board.len(), 1);
    }
}
