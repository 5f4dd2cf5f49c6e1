use std::path::{Path, PathBuf};

use anyhow::Context;
use streakmap_core::{build_grid, build_window, compute_metrics, ContributionMetrics};
use streakmap_doc::{prepare_patch, write_atomic, Injection};
use streakmap_render::{
    encode_png, render_heatmap, render_report, HeatmapLabels, HeatmapStyle, ReportContext,
};
use streakmap_source::{fetch_with_fallback, ContributionSource, GraphQlSource, PublicApiSource};
use time::{Date, OffsetDateTime};

use crate::config::{StreakmapConfig, StreakmapPaths};

/// Everything one run needs, resolved up front.
pub struct RunParams<'a> {
    pub paths: &'a StreakmapPaths,
    pub config: &'a StreakmapConfig,
    pub token: Option<&'a str>,
    pub today: Date,
    pub generated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct RunSummary {
    pub provider: &'static str,
    pub metrics: ContributionMetrics,
    pub image: PathBuf,
    pub document: PathBuf,
    pub injection: Injection,
}

/// `streakmap`: fetch, compute, render, patch.
pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = StreakmapPaths::discover(repo_root);
    let env = |key: &str| std::env::var(key).ok();
    let config = StreakmapConfig::load(&paths, env).context("load configuration")?;
    let token = config.token(env);
    let now = OffsetDateTime::now_utc();

    let summary = run(&RunParams {
        paths: &paths,
        config: &config,
        token: token.as_deref(),
        today: now.date(),
        generated_at: now,
    })?;

    let status = match summary.injection {
        Injection::Updated => "Updated",
        Injection::Unchanged => "Unchanged",
    };
    println!(
        "{status} {} ({} contributions in the last 12 months, current streak {} days)",
        summary.document.display(),
        summary.metrics.total_last_365,
        summary.metrics.current_streak,
    );
    println!("Heatmap written to {}", summary.image.display());
    Ok(())
}

pub fn run(params: &RunParams<'_>) -> anyhow::Result<RunSummary> {
    let config = params.config;
    let root = &params.paths.root;
    let today = params.today;

    // ── Fetch ──
    let primary = PublicApiSource::new(&config.api_base, &config.username, config.timeout());
    let fallback = params.token.map(|token| {
        GraphQlSource::new(
            &config.graphql_endpoint,
            &config.username,
            token,
            config.timeout(),
        )
    });
    let fetched = fetch_with_fallback(
        &primary,
        fallback.as_ref().map(|f| f as &dyn ContributionSource),
        today,
    )
    .with_context(|| format!("fetch contributions for {}", config.username))?;
    tracing::info!(
        provider = fetched.provider,
        days = fetched.payload.contributions.len(),
        "contributions fetched"
    );

    // ── Compute ──
    let counts = fetched
        .payload
        .counts()
        .context("contribution data is malformed")?;
    let metrics = compute_metrics(&counts, today, &fetched.payload.total);
    tracing::debug!(days = counts.len(), ?metrics, "metrics computed");

    let window = build_window(today);
    let grid = build_grid(&counts, &window);

    // ── Render ──
    let heatmap = render_heatmap(
        &grid,
        &HeatmapLabels {
            username: &config.username,
            total_last_365: metrics.total_last_365,
        },
        &HeatmapStyle::default(),
    )?;
    let png = encode_png(&heatmap)?;
    let image_ref = config.image_ref();
    let body = render_report(
        &metrics,
        &ReportContext {
            username: &config.username,
            image_ref: &image_ref,
            image_width: config.image_width,
            today,
            generated_at: params.generated_at,
            source_name: fetched.provider,
        },
    )?;

    // ── Write ──
    // Patch in memory first so a bad document fails before the image is touched.
    let document = config.document_file(root);
    let pending = prepare_patch(&document, &config.marker_start, &config.marker_end, &body)?;

    let image = config.image_file(root);
    write_atomic(&image, &png).with_context(|| format!("write {}", image.display()))?;
    tracing::info!(path = %image.display(), bytes = png.len(), "heatmap written");

    let injection = pending.commit()?;
    tracing::info!(path = %document.display(), ?injection, "document patched");

    Ok(RunSummary {
        provider: fetched.provider,
        metrics,
        image,
        document,
        injection,
    })
}
