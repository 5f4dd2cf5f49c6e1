pub mod heatmap;
pub mod report;

pub use heatmap::{encode_png, render_heatmap, HeatmapLabels, HeatmapStyle, PALETTE};
pub use report::{format_range, render_report, ReportContext};
