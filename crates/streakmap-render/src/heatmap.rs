use std::io::Cursor;

use ab_glyph::{FontRef, PxScale};
use anyhow::Context;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use streakmap_core::{bucket, HeatmapGrid, WEEKDAY_TICKS};
use time::macros::format_description;

/// Cell colours, lightest (no activity) to darkest, indexed by bucket.
pub const PALETTE: [Rgb<u8>; 5] = [
    Rgb([0xeb, 0xed, 0xf0]),
    Rgb([0x9b, 0xe9, 0xa8]),
    Rgb([0x40, 0xc4, 0x63]),
    Rgb([0x30, 0xa1, 0x4e]),
    Rgb([0x21, 0x6e, 0x39]),
];

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const TITLE: Rgb<u8> = Rgb([0x24, 0x29, 0x2f]);
const LABEL: Rgb<u8> = Rgb([0x57, 0x60, 0x6a]);

/// DejaVu Sans, see `assets/DejaVuSans-LICENSE`.
const FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Text drawn around the grid besides the tick labels.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapLabels<'a> {
    pub username: &'a str,
    pub total_last_365: u64,
}

/// Pixel geometry of the rendered heatmap.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapStyle {
    pub cell: u32,
    pub gap: u32,
    pub padding: u32,
    /// Band above everything holding the title.
    pub title_height: u32,
    /// Strip left of the grid holding weekday labels.
    pub gutter_left: u32,
    /// Strip above the grid holding month labels.
    pub gutter_top: u32,
    /// Band below the grid holding the date range and the total.
    pub footer_height: u32,
    pub label_scale: f32,
    pub title_scale: f32,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            cell: 11,
            gap: 3,
            padding: 8,
            title_height: 24,
            gutter_left: 30,
            gutter_top: 16,
            footer_height: 34,
            label_scale: 11.0,
            title_scale: 15.0,
        }
    }
}

impl HeatmapStyle {
    fn pitch(&self) -> u32 {
        self.cell + self.gap
    }

    fn grid_origin(&self) -> (u32, u32) {
        (
            self.padding + self.gutter_left,
            self.padding + self.title_height + self.gutter_top,
        )
    }

    fn grid_bottom(&self) -> u32 {
        self.grid_origin().1 + HeatmapGrid::ROWS as u32 * self.pitch()
    }

    pub fn dimensions(&self, weeks: usize) -> (u32, u32) {
        let (x0, _) = self.grid_origin();
        let width = x0 + weeks as u32 * self.pitch() + self.padding;
        let height = self.grid_bottom() + self.footer_height + self.padding;
        (width, height)
    }

    /// Top-left pixel of the cell at `(weekday, week)`.
    pub fn cell_origin(&self, weekday: usize, week: usize) -> (u32, u32) {
        let (x0, y0) = self.grid_origin();
        (
            x0 + week as u32 * self.pitch(),
            y0 + weekday as u32 * self.pitch(),
        )
    }
}

/// Rasterize the grid: weeks left to right, Monday on the top row, with the
/// title above, month and weekday labels in the gutters, and the date range
/// and 12-month total below.
pub fn render_heatmap(
    grid: &HeatmapGrid,
    labels: &HeatmapLabels<'_>,
    style: &HeatmapStyle,
) -> anyhow::Result<RgbImage> {
    let font = FontRef::try_from_slice(FONT).context("load heatmap font")?;
    let label_scale = PxScale::from(style.label_scale);
    let (width, height) = style.dimensions(grid.weeks);
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let cell = style.cell.max(1);
    for weekday in 0..HeatmapGrid::ROWS {
        for (week, count) in grid.row(weekday).iter().enumerate() {
            let (x, y) = style.cell_origin(weekday, week);
            draw_filled_rect_mut(
                &mut img,
                Rect::at(x as i32, y as i32).of_size(cell, cell),
                PALETTE[bucket(*count)],
            );
        }
    }

    let (x0, y0) = style.grid_origin();
    let pitch = style.pitch() as i32;

    draw_text_mut(
        &mut img,
        TITLE,
        x0 as i32,
        style.padding as i32,
        PxScale::from(style.title_scale),
        &font,
        &format!("@{} · Contributions past 52 weeks", labels.username),
    );

    for tick in &grid.month_ticks {
        let x = x0 as i32 + tick.week as i32 * pitch;
        let y = y0 as i32 - style.gutter_top as i32;
        draw_text_mut(&mut img, LABEL, x, y, label_scale, &font, tick.label);
    }

    for (position, label) in WEEKDAY_TICKS {
        let row = position.floor() as i32;
        let (_, text_h) = text_size(label_scale, &font, label);
        let y = y0 as i32 + row * pitch + (style.cell as i32 - text_h as i32) / 2;
        draw_text_mut(&mut img, LABEL, style.padding as i32, y, label_scale, &font, label);
    }

    let day = format_description!("[day] [month repr:short] [year]");
    let range = format!(
        "{} → {}",
        grid.start.format(day).context("format heatmap start")?,
        grid.end.format(day).context("format heatmap end")?,
    );
    let bottom = style.grid_bottom() as i32;
    let (range_w, _) = text_size(label_scale, &font, &range);
    let grid_w = grid.weeks as i32 * pitch;
    draw_text_mut(
        &mut img,
        LABEL,
        x0 as i32 + (grid_w - range_w as i32) / 2,
        bottom + 4,
        label_scale,
        &font,
        &range,
    );

    let total = format!("{} contributions · last 12 months", labels.total_last_365);
    let (total_w, _) = text_size(label_scale, &font, &total);
    draw_text_mut(
        &mut img,
        PALETTE[4],
        width as i32 - style.padding as i32 - total_w as i32,
        bottom + style.footer_height as i32 / 2 + 2,
        label_scale,
        &font,
        &total,
    );

    tracing::debug!(width, height, weeks = grid.weeks, "heatmap rendered");
    Ok(img)
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("encode heatmap png")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use streakmap_core::{build_grid, build_window, ContributionCounts};
    use time::macros::date;

    const LABELS: HeatmapLabels<'static> = HeatmapLabels {
        username: "octocat",
        total_last_365: 1234,
    };

    fn sample_grid() -> HeatmapGrid {
        let today = date!(2024 - 09 - 18);
        let window = build_window(today);
        let mut counts = ContributionCounts::new();
        counts.insert(today, 20);
        counts.insert(window.start, 2);
        build_grid(&counts, &window)
    }

    fn render(style: &HeatmapStyle) -> RgbImage {
        render_heatmap(&sample_grid(), &LABELS, style).unwrap()
    }

    /// Any non-background pixel in `[x0, x1) × [y0, y1)`.
    fn has_ink(img: &RgbImage, (x0, x1): (u32, u32), (y0, y1): (u32, u32)) -> bool {
        (y0..y1.min(img.height()))
            .flat_map(|y| (x0..x1.min(img.width())).map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) != BACKGROUND)
    }

    #[test]
    fn image_size_follows_style() {
        let style = HeatmapStyle::default();
        let img = render(&style);
        assert_eq!(img.dimensions(), style.dimensions(52));
        assert_eq!(img.width(), 8 + 30 + 52 * 14 + 8);
        assert_eq!(img.height(), 8 + 24 + 16 + 7 * 14 + 34 + 8);
    }

    #[test]
    fn cells_are_coloured_by_bucket() {
        let style = HeatmapStyle::default();
        let grid = sample_grid();
        let img = render_heatmap(&grid, &LABELS, &style).unwrap();

        let today_row = usize::from(grid.end.weekday().number_days_from_monday());
        let (x, y) = style.cell_origin(today_row, 51);
        assert_eq!(*img.get_pixel(x + 5, y + 5), PALETTE[4]);

        let start_row = usize::from(grid.start.weekday().number_days_from_monday());
        let (x, y) = style.cell_origin(start_row, 0);
        assert_eq!(*img.get_pixel(x + 5, y + 5), PALETTE[1]);

        let empty_row = (start_row + 1) % 7;
        let (x, y) = style.cell_origin(empty_row, 10);
        assert_eq!(*img.get_pixel(x, y), PALETTE[0]);
    }

    #[test]
    fn gaps_between_cells_stay_background() {
        let style = HeatmapStyle::default();
        let img = render(&style);
        let (x, y) = style.cell_origin(3, 20);
        assert_eq!(*img.get_pixel(x + style.cell, y), BACKGROUND);
    }

    #[test]
    fn labels_are_drawn_in_the_gutters() {
        let style = HeatmapStyle::default();
        let img = render(&style);
        let (x0, y0) = style.grid_origin();
        let pitch = style.pitch();

        // Weekday labels: Monday row and the empty Tuesday row.
        assert!(has_ink(&img, (style.padding, x0), (y0, y0 + pitch)));
        assert!(!has_ink(&img, (style.padding, x0), (y0 + pitch + 2, y0 + 2 * pitch - 2)));

        // First month label sits above week 0.
        assert!(has_ink(&img, (x0, x0 + 3 * pitch), (y0 - style.gutter_top, y0)));

        // Title band.
        let title_band = (style.padding, style.padding + style.title_height);
        assert!(has_ink(&img, (x0, img.width()), title_band));

        // Footer: centred date range, right-aligned total in green.
        let bottom = style.grid_bottom();
        assert!(has_ink(&img, (x0, img.width()), (bottom, bottom + style.footer_height / 2)));
        let footer = bottom + style.footer_height / 2..img.height();
        let right = img.width() / 2..img.width();
        let green = footer
            .flat_map(|y| right.clone().map(move |x| (x, y)))
            .any(|(x, y)| {
                let Rgb([r, g, _]) = *img.get_pixel(x, y);
                g > r.saturating_add(20)
            });
        assert!(green);
    }

    #[test]
    fn tiny_gutters_do_not_panic() {
        let style = HeatmapStyle {
            padding: 0,
            title_height: 0,
            gutter_left: 2,
            gutter_top: 1,
            footer_height: 0,
            ..HeatmapStyle::default()
        };
        let img = render(&style);
        assert_eq!(img.dimensions(), style.dimensions(52));
    }

    #[test]
    fn png_round_trips_through_decoder() {
        let img = render(&HeatmapStyle::default());
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), img.dimensions());
    }
}
