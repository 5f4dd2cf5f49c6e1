pub mod counts;
pub mod grid;
pub mod metrics;
pub mod window;

pub use counts::{parse_date, ContributionCounts, CoreError};
pub use grid::{bucket, build_grid, HeatmapGrid, MonthTick, BUCKET_BOUNDS, WEEKDAY_TICKS};
pub use metrics::{compute_metrics, ContributionMetrics, DateRange};
pub use window::{build_window, Window, WINDOW_DAYS};
