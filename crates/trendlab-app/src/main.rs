// Trend lab entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is reserved for the report)
// 2. Load config (copying defaults/ into config/ on first run)
// 3. Load the monthly split files
// 4. Compute the metric table and league baselines
// 5. Build the configured trend view and print it
// 6. Optionally write the JSON export

use std::path::Path;

use anyhow::Context;
use tracing::info;

use trendlab_app::report;
use trendlab_baseball::loader;
use trendlab_baseball::metrics::compute_metric_table;
use trendlab_baseball::trend::{build_trend_view, TrendQuery};
use trendlab_core::config;

fn main() -> anyhow::Result<()> {
    // 1. Tracing
    init_tracing()?;
    info!("Trend lab starting up");

    // 2. Config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: data dir {}, FWOBA target {:.3} +/- {:.3}",
        config.data.dir, config.fwoba.target_mean, config.fwoba.target_stdev
    );
    let query =
        TrendQuery::from_view_config(&config.view).context("invalid [view] configuration")?;

    // 3. Dataset
    let observations = loader::load_all(&config)
        .with_context(|| format!("failed to load monthly splits from {}", config.data.dir))?;

    // 4. Metrics, recomputed from scratch for this dataset
    let table = compute_metric_table(&observations, &config);

    // 5. View
    let view = build_trend_view(&table, &query);
    info!(
        "Trend view: {} for {} players, {} points",
        view.metric,
        view.players.len(),
        view.points.len()
    );
    println!("{}", report::render_trend_table(&view));
    println!("{}", report::render_playing_time(&view, &config.usage));
    print!("{}", report::render_baselines(&table.baselines));

    // 6. Export
    if let Some(path) = &config.output.json_path {
        report::write_json_export(Path::new(path), &table, &view)?;
        info!("Wrote JSON export to {}", path);
    }

    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which carries the report).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("trendlab.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("trendlab_app=info,trendlab_baseball=info,trendlab_core=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
