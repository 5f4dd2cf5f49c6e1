use time::{Date, Duration, Month};

use crate::counts::ContributionCounts;
use crate::window::Window;

/// Inclusive lower bound of each intensity bucket. The last bucket is open-ended.
pub const BUCKET_BOUNDS: [u64; 5] = [0, 1, 4, 8, 12];

/// Row tick positions and labels (row 0 is Monday).
pub const WEEKDAY_TICKS: [(f64, &str); 4] =
    [(0.5, "Mon"), (2.5, "Wed"), (4.5, "Fri"), (6.5, "Sun")];

/// Map a count onto its intensity bucket, `0..BUCKET_BOUNDS.len()`.
pub fn bucket(count: u64) -> usize {
    BUCKET_BOUNDS
        .iter()
        .rposition(|&lower| count >= lower)
        .unwrap_or(0)
}

/// Column label emitted where a new month begins.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthTick {
    pub week: usize,
    /// Column centre, `week + 0.5`.
    pub position: f64,
    pub label: &'static str,
}

/// Counts laid out as 7 weekday rows by `weeks` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub start: Date,
    pub end: Date,
    pub weeks: usize,
    rows: Vec<Vec<u64>>,
    pub month_ticks: Vec<MonthTick>,
}

impl HeatmapGrid {
    pub const ROWS: usize = 7;

    /// Count at `(weekday, week)`, weekday 0 = Monday.
    pub fn cell(&self, weekday: usize, week: usize) -> u64 {
        self.rows[weekday][week]
    }

    pub fn row(&self, weekday: usize) -> &[u64] {
        &self.rows[weekday]
    }
}

/// Fold the window's dates into a weekday × week grid. Dates with no recorded
/// count become 0.
pub fn build_grid(counts: &ContributionCounts, window: &Window) -> HeatmapGrid {
    let weeks = window.weeks();
    let mut rows = vec![vec![0u64; weeks]; HeatmapGrid::ROWS];
    for (idx, day) in window.dates.iter().enumerate() {
        let weekday = usize::from(day.weekday().number_days_from_monday());
        rows[weekday][idx / 7] = counts.get(*day);
    }

    HeatmapGrid {
        start: window.start,
        end: window.end,
        weeks,
        rows,
        month_ticks: month_ticks(window.start, weeks),
    }
}

fn month_ticks(start: Date, weeks: usize) -> Vec<MonthTick> {
    let mut ticks = Vec::new();
    let mut prev: Option<Month> = None;
    for week in 0..weeks {
        let week_start = start + Duration::days(week as i64 * 7);
        let month = week_start.month();
        if prev != Some(month) {
            ticks.push(MonthTick {
                week,
                position: week as f64 + 0.5,
                label: month_abbrev(month),
            });
            prev = Some(month);
        }
    }
    ticks
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
