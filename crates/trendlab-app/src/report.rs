// Plain-text and JSON rendering of a computed trend view.

use anyhow::Context;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use trendlab_baseball::metrics::{LeagueBaselines, Metric, MetricTable};
use trendlab_baseball::observation::month_label;
use trendlab_baseball::trend::TrendView;
use trendlab_baseball::usage::is_full_time;
use trendlab_core::config::UsageConfig;

/// Placeholder for a value the engine marked not computable.
const MISSING: &str = "-";

fn format_value(metric: Metric, value: Option<f64>) -> String {
    match value {
        Some(v) if metric.is_rate() => format!("{v:.3}"),
        Some(v) if metric == Metric::Fwar => format!("{v:.1}"),
        Some(v) => format!("{v:.0}"),
        None => MISSING.to_string(),
    }
}

/// Player-by-month grid for the view's metric, followed by the baseline.
pub fn render_trend_table(view: &TrendView) -> String {
    let mut out = String::new();
    let season = view
        .season
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no season".into());
    let _ = writeln!(out, "{} by Month: {}", view.metric, season);

    if view.is_empty() {
        let _ = writeln!(out, "No data for current filters.");
        return out;
    }

    let name_width = view
        .players
        .iter()
        .map(|p| p.len())
        .max()
        .unwrap_or(0)
        .max("Player".len());

    let _ = write!(out, "{:<name_width$}  {:<4}", "Player", "Team");
    for m in &view.months {
        let _ = write!(out, "  {:>6}", month_label(*m).unwrap_or("?"));
    }
    out.push('\n');

    for player in &view.players {
        let points: Vec<_> = view.points.iter().filter(|p| &p.name == player).collect();
        let team = points.last().map(|p| p.team.as_str()).unwrap_or("");
        let _ = write!(out, "{player:<name_width$}  {team:<4}");
        for m in &view.months {
            let cell = points
                .iter()
                .find(|p| p.month == *m)
                .map(|p| format_value(view.metric, p.value))
                .unwrap_or_default();
            let _ = write!(out, "  {cell:>6}");
        }
        out.push('\n');
    }

    match view.baseline {
        Some(b) => {
            let _ = writeln!(out, "League baseline ({}): {b:.3}", view.metric);
        }
        None if view.metric.is_rate() => {
            let _ = writeln!(out, "League baseline ({}): undefined", view.metric);
        }
        None => {}
    }
    out
}

/// Monthly PA per plotted player; `*` marks a full-time month.
pub fn render_playing_time(view: &TrendView, usage: &UsageConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Playing time (PA; * = at least {} PA)",
        usage.full_time_pa
    );
    for player in &view.players {
        let cells: Vec<String> = view
            .points
            .iter()
            .filter(|p| &p.name == player)
            .map(|p| {
                let mark = if is_full_time(p.pa, usage) { "*" } else { "" };
                format!("{} {}{}", p.label.unwrap_or("?"), p.pa, mark)
            })
            .collect();
        let _ = writeln!(out, "  {player}: {}", cells.join(", "));
    }
    out
}

/// Every defined baseline, one per line.
pub fn render_baselines(baselines: &LeagueBaselines) -> String {
    let mut out = String::from("League baselines (PA-weighted)\n");
    if baselines.is_empty() {
        out.push_str("  none defined for this dataset\n");
        return out;
    }
    for (metric, value) in baselines.iter() {
        let _ = writeln!(out, "  {:<6} {value:.3}", metric.as_str());
    }
    out
}

#[derive(Serialize)]
struct Export<'a> {
    table: &'a MetricTable,
    view: &'a TrendView,
}

/// Write the full metric table and the current view as pretty JSON.
pub fn write_json_export(path: &Path, table: &MetricTable, view: &TrendView) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&Export { table, view })
        .context("failed to serialize metric table")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
