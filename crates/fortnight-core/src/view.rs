//! View composers.
//!
//! A `PlannerView` is one calendar surface: a window kind, a navigation
//! cursor, and display settings. Projection reads task data exclusively
//! through the `TaskStore` passed in by the caller — the two live views
//! share one store, so a task created through either is visible in the
//! other the moment the store holds it.

use chrono::NaiveDate;
use tracing::debug;

use crate::grid::{self, GridCell, GridMode, TWO_WEEK_LEN};
use crate::settings::{ViewSettings, WeekStart};
use crate::store::TaskStore;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewWindow {
    TwoWeek,
    Month,
}

#[derive(Debug, Clone)]
pub struct PlannerView {
    window: ViewWindow,
    cursor: NaiveDate,
    pub settings: ViewSettings,
}

/// One grid position joined with the tasks scheduled on it.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub cell: GridCell,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewProjection {
    pub heading: String,
    pub weekday_labels: [&'static str; 7],
    pub cells: Vec<DayCell>,
}

impl PlannerView {
    pub fn two_week(anchor: NaiveDate, settings: ViewSettings) -> Self {
        Self {
            window: ViewWindow::TwoWeek,
            cursor: anchor,
            settings,
        }
    }

    pub fn month(cursor: NaiveDate, settings: ViewSettings) -> Self {
        Self {
            window: ViewWindow::Month,
            cursor,
            settings,
        }
    }

    pub fn window(&self) -> ViewWindow {
        self.window
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn step_forward(&mut self) {
        self.shift(1);
    }

    pub fn step_back(&mut self) {
        self.shift(-1);
    }

    fn shift(&mut self, step: i32) {
        self.cursor = match self.window {
            ViewWindow::TwoWeek => grid::add_days(self.cursor, step as i64 * TWO_WEEK_LEN as i64),
            ViewWindow::Month => grid::shift_months(self.cursor, step),
        };
        debug!(cursor = %self.cursor, "view cursor moved");
    }

    /// Project the shared store through this view's window.
    pub fn project(&self, store: &TaskStore, today: NaiveDate) -> ViewProjection {
        let mode = match self.window {
            ViewWindow::TwoWeek => GridMode::TwoWeek,
            ViewWindow::Month => GridMode::Month,
        };
        let cells = grid::build_grid(self.cursor, today, mode, &self.settings)
            .into_iter()
            .map(|cell| DayCell {
                tasks: cell.date.map(|date| store.tasks_on(date)).unwrap_or_default(),
                cell,
            })
            .collect();

        ViewProjection {
            heading: self.heading(),
            weekday_labels: weekday_labels(self.settings.week_start),
            cells,
        }
    }

    fn heading(&self) -> String {
        match self.window {
            ViewWindow::Month => self.cursor.format("%B %Y").to_string(),
            ViewWindow::TwoWeek => {
                let start = grid::start_of_week(self.cursor, self.settings.week_start.weekday());
                let end = grid::add_days(start, TWO_WEEK_LEN as i64 - 1);
                format!("{} - {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
        }
    }
}

const SUNDAY_FIRST: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONDAY_FIRST: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn weekday_labels(week_start: WeekStart) -> [&'static str; 7] {
    match week_start {
        WeekStart::Sunday => SUNDAY_FIRST,
        WeekStart::Monday => MONDAY_FIRST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskId};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn task(id: u64, day: NaiveDate, title: &str) -> Task {
        Task {
            id: TaskId(id),
            date: day,
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            time: None,
        }
    }

    #[test]
    fn projection_joins_tasks_onto_their_cells() {
        let mut store = TaskStore::new();
        let day = date(2025, 9, 8);
        store.upsert(task(42, day, "Submit assignment"));

        let view = PlannerView::two_week(day, ViewSettings::default());
        let projection = view.project(&store, day);

        assert_eq!(projection.cells.len(), TWO_WEEK_LEN);
        let populated: Vec<&DayCell> = projection
            .cells
            .iter()
            .filter(|cell| !cell.tasks.is_empty())
            .collect();
        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].cell.date, Some(day));
        assert_eq!(populated[0].tasks[0].title, "Submit assignment");
    }

    #[test]
    fn both_views_see_the_same_store() {
        let mut store = TaskStore::new();
        let day = date(2025, 9, 8);
        store.upsert(task(42, day, "Submit assignment"));

        let settings = ViewSettings::default();
        let month = PlannerView::month(date(2025, 9, 1), settings);
        let fortnight = PlannerView::two_week(day, settings);

        let in_month = month.project(&store, day);
        let in_fortnight = fortnight.project(&store, day);

        for projection in [&in_month, &in_fortnight] {
            assert!(
                projection
                    .cells
                    .iter()
                    .any(|cell| cell.cell.date == Some(day) && !cell.tasks.is_empty()),
                "task must appear in every window covering its date"
            );
        }
    }

    #[test]
    fn two_week_navigation_steps_by_fourteen_days() {
        let mut view = PlannerView::two_week(date(2025, 9, 8), ViewSettings::default());
        view.step_forward();
        assert_eq!(view.cursor(), date(2025, 9, 22));
        view.step_back();
        view.step_back();
        assert_eq!(view.cursor(), date(2025, 8, 25));
    }

    #[test]
    fn month_navigation_steps_by_calendar_month() {
        let mut view = PlannerView::month(date(2025, 1, 31), ViewSettings::default());
        view.step_forward();
        assert_eq!(view.cursor(), date(2025, 2, 28));
        view.step_back();
        assert_eq!(view.cursor(), date(2025, 1, 28));
    }

    #[test]
    fn headings_describe_the_window() {
        let month = PlannerView::month(date(2025, 9, 1), ViewSettings::default());
        assert_eq!(month.project(&TaskStore::new(), date(2025, 9, 1)).heading, "September 2025");

        let fortnight = PlannerView::two_week(date(2025, 9, 10), ViewSettings::default());
        assert_eq!(
            fortnight.project(&TaskStore::new(), date(2025, 9, 10)).heading,
            "2025-09-07 - 2025-09-20"
        );
    }

    #[test]
    fn weekday_labels_follow_the_week_start() {
        let monday_settings = ViewSettings {
            week_start: WeekStart::Monday,
            ..ViewSettings::default()
        };
        let view = PlannerView::month(date(2025, 9, 1), monday_settings);
        let projection = view.project(&TaskStore::new(), date(2025, 9, 1));
        assert_eq!(projection.weekday_labels[0], "Mon");
        assert_eq!(projection.weekday_labels[6], "Sun");
    }
}
