mod cmd_run;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `STREAKMAP_LOG=debug`.
const LOG_ENV: &str = "STREAKMAP_LOG";

#[derive(Parser)]
#[command(
    name = "streakmap",
    version,
    about = "Render a contributions heatmap and streak stats into your README"
)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();
    init_tracing();
    let repo_root = std::env::current_dir()?;
    cmd_run::execute(&repo_root)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}
