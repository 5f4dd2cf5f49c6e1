use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration};

use crate::counts::ContributionCounts;

/// Lookback for the aggregate total. Inclusive at both ends, so the span is
/// 366 days. Deliberately wider than the 364-day display window.
const TOTAL_LOOKBACK_DAYS: i64 = 365;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// Summary statistics for one run. Built once by [`compute_metrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionMetrics {
    pub total_last_365: u64,
    pub total_year: u64,
    pub current_streak: u32,
    pub current_streak_range: Option<DateRange>,
    pub longest_streak: u32,
    pub longest_streak_range: Option<DateRange>,
    pub best_day_count: u64,
    pub best_day: Option<Date>,
}

/// Derive streaks, totals and best day from daily counts.
///
/// `yearly_totals` is keyed by year string (`"2024"`) and is taken as the
/// authoritative calendar-year total; daily counts are never re-summed for it.
pub fn compute_metrics(
    counts: &ContributionCounts,
    today: Date,
    yearly_totals: &BTreeMap<String, u64>,
) -> ContributionMetrics {
    let lookback_start = today - Duration::days(TOTAL_LOOKBACK_DAYS);
    let total_last_365: u64 = counts
        .iter()
        .filter(|(day, _)| *day >= lookback_start && *day <= today)
        .map(|(_, count)| count)
        .sum();

    let total_year = yearly_totals
        .get(&today.year().to_string())
        .copied()
        .unwrap_or(0);

    let (longest_streak, longest_streak_range) = longest_streak(counts);
    let (current_streak, current_streak_range) = current_streak(counts, today);
    let (best_day_count, best_day) = best_day(counts);

    ContributionMetrics {
        total_last_365,
        total_year,
        current_streak,
        current_streak_range,
        longest_streak,
        longest_streak_range,
        best_day_count,
        best_day,
    }
}

/// Longest run of consecutive positive days. Strict `>` keeps the earliest
/// run when two runs tie.
fn longest_streak(counts: &ContributionCounts) -> (u32, Option<DateRange>) {
    let mut longest = 0u32;
    let mut longest_range = None;
    let mut run = 0u32;
    let mut run_start: Option<Date> = None;
    let mut prev: Option<Date> = None;

    for (day, count) in counts.iter() {
        let contiguous = prev.and_then(Date::next_day) == Some(day);
        prev = Some(day);

        if count == 0 || !contiguous {
            run = 0;
            run_start = None;
        }
        if count == 0 {
            continue;
        }

        let start = *run_start.get_or_insert(day);
        run += 1;
        if run > longest {
            longest = run;
            longest_range = Some(DateRange { start, end: day });
        }
    }

    (longest, longest_range)
}

/// Run of positive days ending at the most recent recorded day on or before
/// `today`. A zero day or a hole in the dates stops the walk backwards.
fn current_streak(counts: &ContributionCounts, today: Date) -> (u32, Option<DateRange>) {
    let mut length = 0u32;
    let mut end: Option<Date> = None;
    let mut expected: Option<Date> = None;

    for (day, count) in counts.iter().rev() {
        if day > today {
            continue;
        }
        if count == 0 {
            break;
        }
        if expected.is_some_and(|e| e != day) {
            break;
        }
        end.get_or_insert(day);
        length += 1;
        expected = day.previous_day();
    }

    let range = end.map(|end| DateRange {
        start: end - Duration::days(i64::from(length) - 1),
        end,
    });
    (length, range)
}

/// Highest single-day count; the earliest date wins ties.
fn best_day(counts: &ContributionCounts) -> (u64, Option<Date>) {
    let mut best_count = 0u64;
    let mut best = None;
    for (day, count) in counts.iter() {
        if count > best_count {
            best_count = count;
            best = Some(day);
        }
    }
    (best_count, best)
}
