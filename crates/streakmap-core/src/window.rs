use time::{Date, Duration};

/// Days in the trailing "last 12 months" span before cropping to whole weeks.
const TRAILING_DAYS: i64 = 365;

/// Days in the display window: 52 full weeks.
pub const WINDOW_DAYS: usize = 364;

/// A contiguous, inclusive run of dates ending on `end`.
///
/// Always exactly [`WINDOW_DAYS`] long, so it folds into a 7 × 52 grid with no
/// padding cells and nothing after `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: Date,
    pub end: Date,
    pub dates: Vec<Date>,
}

impl Window {
    pub fn weeks(&self) -> usize {
        self.dates.len() / 7
    }
}

/// Build the 52-week display window ending at `today`.
///
/// Starts from the inclusive last 365 days and crops the earliest days until
/// the span divides by 7. Pure calendar arithmetic, no clock or timezone.
pub fn build_window(today: Date) -> Window {
    let mut start = today - Duration::days(TRAILING_DAYS - 1);
    let remainder = TRAILING_DAYS % 7;
    if remainder != 0 {
        start += Duration::days(remainder);
    }

    let span = (today - start).whole_days() + 1;
    let dates = (0..span).map(|i| start + Duration::days(i)).collect();
    Window {
        start,
        end: today,
        dates,
    }
}
