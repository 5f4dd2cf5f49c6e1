use anyhow::Context;
use streakmap_core::{ContributionMetrics, DateRange};
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const NONE: &str = "—";

/// Inputs to the report besides the metrics themselves.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub username: &'a str,
    /// Image reference as written into the document, relative to it.
    pub image_ref: &'a str,
    pub image_width: u32,
    pub today: Date,
    pub generated_at: OffsetDateTime,
    pub source_name: &'a str,
}

/// `start → end`, `start → today` when the range ends today, `—` when absent.
pub fn format_range(range: Option<DateRange>, today: Date) -> String {
    match range {
        None => NONE.to_string(),
        Some(DateRange { start, end }) if end == today => format!("{start} → today"),
        Some(DateRange { start, end }) => format!("{start} → {end}"),
    }
}

/// Render the block that sits between the document markers (markers excluded).
pub fn render_report(
    metrics: &ContributionMetrics,
    ctx: &ReportContext<'_>,
) -> anyhow::Result<String> {
    let timestamp = ctx
        .generated_at
        .to_offset(UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .context("format report timestamp")?;

    let best_day = match metrics.best_day {
        Some(day) if metrics.best_day_count > 0 => format!("{} on {day}", metrics.best_day_count),
        _ => NONE.to_string(),
    };

    let mut out = String::new();
    out.push('\n');
    out.push_str("<p align=\"center\">\n");
    out.push_str(&format!(
        "  <img src=\"{}\" alt=\"GitHub contributions heatmap for {}\" width=\"{}\" />\n",
        ctx.image_ref, ctx.username, ctx.image_width
    ));
    out.push_str("</p>\n\n");
    out.push_str("<div align=\"center\">\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("| --- | --- |\n");
    out.push_str(&format!(
        "| Contributions (last 12 months) | {} |\n",
        metrics.total_last_365
    ));
    out.push_str(&format!(
        "| Contributions ({}) | {} |\n",
        ctx.today.year(),
        metrics.total_year
    ));
    out.push_str(&format!(
        "| Current streak | {} days ({}) |\n",
        metrics.current_streak,
        format_range(metrics.current_streak_range, ctx.today)
    ));
    out.push_str(&format!(
        "| Longest streak | {} days ({}) |\n",
        metrics.longest_streak,
        format_range(metrics.longest_streak_range, ctx.today)
    ));
    out.push_str(&format!("| Best day | {best_day} |\n\n"));
    out.push_str("</div>\n\n");
    out.push_str(&format!(
        "<p align=\"center\"><sub>Last updated {timestamp} · Source: {}</sub></p>\n",
        ctx.source_name
    ));
    Ok(out)
}
