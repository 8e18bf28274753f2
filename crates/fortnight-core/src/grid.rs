//! Calendar grid generation.
//!
//! Pure functions from a reference date plus display settings to an ordered
//! run of day cells. Nothing here touches the wall clock or any store; the
//! `today` marker is an explicit argument so every output is reproducible
//! from its inputs.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::settings::ViewSettings;

/// Which window a view projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// A rolling strip of exactly 14 dated cells, aligned to the week start.
    TwoWeek,
    /// Every day of the reference month, left-padded so day 1 lands under
    /// its weekday column.
    Month,
}

pub const TWO_WEEK_LEN: usize = 14;

/// One grid position. `date` is `None` for month-mode padding cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: Option<NaiveDate>,
    pub weekend: bool,
    pub today: bool,
}

pub fn build_grid(
    reference: NaiveDate,
    today: NaiveDate,
    mode: GridMode,
    settings: &ViewSettings,
) -> Vec<GridCell> {
    match mode {
        GridMode::TwoWeek => two_week_cells(reference, today, settings),
        GridMode::Month => month_cells(reference, today, settings),
    }
}

fn two_week_cells(reference: NaiveDate, today: NaiveDate, settings: &ViewSettings) -> Vec<GridCell> {
    let start = start_of_week(reference, settings.week_start.weekday());
    (0..TWO_WEEK_LEN as i64)
        .map(|offset| day_cell(add_days(start, offset), today, settings))
        .collect()
}

fn month_cells(reference: NaiveDate, today: NaiveDate, settings: &ViewSettings) -> Vec<GridCell> {
    let first = first_day_of_month(reference.year(), reference.month());
    let start_idx = settings.week_start.weekday().num_days_from_monday() as i64;
    let first_idx = first.weekday().num_days_from_monday() as i64;
    let leading = (7 + first_idx - start_idx) % 7;

    let mut cells = Vec::with_capacity(leading as usize + 31);
    for _ in 0..leading {
        cells.push(GridCell {
            date: None,
            weekend: false,
            today: false,
        });
    }
    for day in 0..days_in_month(reference.year(), reference.month()) as i64 {
        cells.push(day_cell(add_days(first, day), today, settings));
    }
    cells
}

fn day_cell(date: NaiveDate, today: NaiveDate, settings: &ViewSettings) -> GridCell {
    GridCell {
        date: Some(date),
        weekend: settings.highlight_weekends && is_weekend(date),
        today: date == today,
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The most recent occurrence of `week_start` on or before `day`.
pub fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let day_idx = day.weekday().num_days_from_monday() as i64;
    let start_idx = week_start.num_days_from_monday() as i64;
    let diff = (7 + day_idx - start_idx) % 7;
    add_days(day, -diff)
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

pub fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month >= 12 {
        (year.saturating_add(1), 1_u32)
    } else {
        (year, month + 1)
    };
    add_days(first_day_of_month(next_year, next_month), -1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).day()
}

/// Shift a date by whole calendar months, clamping the day to the target
/// month's length.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;

    while month < 1 {
        month += 12;
        year = year.saturating_sub(1);
    }
    while month > 12 {
        month -= 12;
        year = year.saturating_add(1);
    }

    let month = month as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WeekStart;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn settings(week_start: WeekStart) -> ViewSettings {
        ViewSettings {
            week_start,
            ..ViewSettings::default()
        }
    }

    #[test]
    fn two_week_grid_is_fourteen_dated_cells_on_the_week_start() {
        // 2025-09-08 is a Monday.
        for (week_start, expected_start) in [
            (WeekStart::Sunday, date(2025, 9, 7)),
            (WeekStart::Monday, date(2025, 9, 8)),
        ] {
            let cells = build_grid(
                date(2025, 9, 10),
                date(2025, 9, 10),
                GridMode::TwoWeek,
                &settings(week_start),
            );
            assert_eq!(cells.len(), TWO_WEEK_LEN);
            assert_eq!(cells[0].date, Some(expected_start));
            assert_eq!(cells[13].date, Some(add_days(expected_start, 13)));
            assert!(cells.iter().all(|cell| cell.date.is_some()));
        }
    }

    #[test]
    fn two_week_grid_starting_on_the_week_start_does_not_rewind() {
        let cells = build_grid(
            date(2025, 9, 7),
            date(2025, 9, 7),
            GridMode::TwoWeek,
            &settings(WeekStart::Sunday),
        );
        assert_eq!(cells[0].date, Some(date(2025, 9, 7)));
    }

    #[test]
    fn month_grid_cell_counts_by_table() {
        // (year, month, week start, leading blanks, days)
        let table = [
            (2025, 9, WeekStart::Sunday, 1, 30),  // Sep 2025 starts Monday
            (2025, 9, WeekStart::Monday, 0, 30),
            (2025, 6, WeekStart::Sunday, 0, 30),  // Jun 2025 starts Sunday
            (2025, 6, WeekStart::Monday, 6, 30),
            (2024, 2, WeekStart::Sunday, 4, 29),  // leap February starts Thursday
            (2025, 2, WeekStart::Sunday, 6, 28),  // Feb 2025 starts Saturday
            (2025, 12, WeekStart::Monday, 0, 31), // Dec 2025 starts Monday
        ];

        for (year, month, week_start, leading, days) in table {
            let cells = build_grid(
                date(year, month, 15),
                date(year, month, 15),
                GridMode::Month,
                &settings(week_start),
            );
            assert_eq!(cells.len(), leading + days, "{year}-{month} {week_start:?}");
            assert!(cells[..leading].iter().all(|cell| cell.date.is_none()));
            assert_eq!(cells[leading].date, Some(date(year, month, 1)));
            assert_eq!(
                cells[cells.len() - 1].date,
                Some(date(year, month, days as u32))
            );
        }
    }

    #[test]
    fn month_grid_first_day_lands_under_its_weekday_column() {
        let cells = build_grid(
            date(2025, 9, 1),
            date(2025, 9, 1),
            GridMode::Month,
            &settings(WeekStart::Sunday),
        );
        // Column index within the week equals days since the week start.
        let first_real = cells
            .iter()
            .position(|cell| cell.date.is_some())
            .expect("month has days");
        let first_date = cells[first_real].date.expect("dated cell");
        let day_idx = first_date.weekday().num_days_from_monday() as i64;
        let start_idx = Weekday::Sun.num_days_from_monday() as i64;
        assert_eq!(first_real as i64, (7 + day_idx - start_idx) % 7);
    }

    #[test]
    fn today_flag_tracks_the_argument_not_the_clock() {
        let cells = build_grid(
            date(2025, 9, 1),
            date(2025, 9, 10),
            GridMode::Month,
            &settings(WeekStart::Sunday),
        );
        let marked: Vec<NaiveDate> = cells
            .iter()
            .filter(|cell| cell.today)
            .filter_map(|cell| cell.date)
            .collect();
        assert_eq!(marked, vec![date(2025, 9, 10)]);
    }

    #[test]
    fn weekend_flag_follows_the_highlight_setting() {
        let highlighted = build_grid(
            date(2025, 9, 1),
            date(2025, 9, 1),
            GridMode::TwoWeek,
            &settings(WeekStart::Sunday),
        );
        assert_eq!(highlighted.iter().filter(|cell| cell.weekend).count(), 4);

        let plain_settings = ViewSettings {
            highlight_weekends: false,
            ..ViewSettings::default()
        };
        let plain = build_grid(
            date(2025, 9, 1),
            date(2025, 9, 1),
            GridMode::TwoWeek,
            &plain_settings,
        );
        assert!(plain.iter().all(|cell| !cell.weekend));
    }

    #[test]
    fn month_arithmetic_clamps_the_day() {
        assert_eq!(shift_months(date(2025, 1, 31), 1), date(2025, 2, 28));
        assert_eq!(shift_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(shift_months(date(2025, 3, 31), -1), date(2025, 2, 28));
        assert_eq!(shift_months(date(2025, 12, 15), 1), date(2026, 1, 15));
        assert_eq!(shift_months(date(2025, 1, 15), -1), date(2024, 12, 15));
    }

    #[test]
    fn days_in_month_table() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 9), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }
}
