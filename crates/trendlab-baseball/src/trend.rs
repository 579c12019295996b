// Trend view: the filtered per-player monthly series a chart layer plots,
// plus the metric's league baseline for the reference line.

use serde::Serialize;
use std::collections::BTreeSet;
use trendlab_core::config::ViewConfig;

use crate::metrics::{Metric, MetricTable, UnknownMetric};
use crate::observation::SEASON_MONTHS;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Filters for one trend view.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendQuery {
    /// `None` picks the latest season in the dataset.
    pub season: Option<i32>,
    /// Empty picks every Apr-Sep month present for the season.
    pub months: Vec<u8>,
    pub min_pa: u32,
    /// Case-insensitive substring match on player name.
    pub search: String,
    /// Empty picks the first `max_players` names alphabetically.
    pub players: Vec<String>,
    pub max_players: usize,
    pub metric: Metric,
}

impl Default for TrendQuery {
    fn default() -> Self {
        TrendQuery {
            season: None,
            months: Vec::new(),
            min_pa: 0,
            search: String::new(),
            players: Vec::new(),
            max_players: 8,
            metric: Metric::Fwoba,
        }
    }
}

impl TrendQuery {
    pub fn from_view_config(view: &ViewConfig) -> Result<Self, UnknownMetric> {
        Ok(TrendQuery {
            season: view.season,
            months: view.months.clone(),
            min_pa: view.min_pa,
            search: view.search.clone(),
            players: view.players.clone(),
            max_players: view.max_players,
            metric: view.metric.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub name: String,
    pub team: String,
    pub season: i32,
    pub month: u8,
    pub label: Option<&'static str>,
    pub pa: u32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub metric: Metric,
    pub season: Option<i32>,
    pub months: Vec<u8>,
    /// Every name that passed the filters, sorted.
    pub candidates: Vec<String>,
    /// The plotted subset of `candidates`.
    pub players: Vec<String>,
    /// Sorted by (name, month).
    pub points: Vec<TrendPoint>,
    /// Dataset-wide baseline; `None` means draw no reference line.
    pub baseline: Option<f64>,
}

impl TrendView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub fn build_trend_view(table: &MetricTable, query: &TrendQuery) -> TrendView {
    let metric = query.metric;
    let baseline = table.baselines.get(metric).ok();

    let season = query
        .season
        .or_else(|| table.rows.iter().map(|r| r.observation.season).max());
    let Some(season) = season else {
        return TrendView {
            metric,
            season: None,
            months: Vec::new(),
            candidates: Vec::new(),
            players: Vec::new(),
            points: Vec::new(),
            baseline,
        };
    };

    let months: Vec<u8> = if query.months.is_empty() {
        let available: BTreeSet<u8> = table
            .rows
            .iter()
            .filter(|r| r.observation.season == season)
            .map(|r| r.observation.month)
            .collect();
        SEASON_MONTHS
            .into_iter()
            .filter(|m| available.contains(m))
            .collect()
    } else {
        query.months.clone()
    };

    let needle = query.search.trim().to_lowercase();
    let base: Vec<_> = table
        .rows
        .iter()
        .filter(|r| {
            let o = &r.observation;
            o.season == season
                && months.contains(&o.month)
                && o.pa >= query.min_pa
                && (needle.is_empty() || o.name.to_lowercase().contains(&needle))
        })
        .collect();

    let candidates: Vec<String> = base
        .iter()
        .map(|r| r.observation.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut players: Vec<String> = if query.players.is_empty() {
        candidates.clone()
    } else {
        query
            .players
            .iter()
            .filter(|p| candidates.contains(*p))
            .cloned()
            .collect()
    };
    players.truncate(query.max_players);

    let mut points: Vec<TrendPoint> = base
        .iter()
        .filter(|r| players.contains(&r.observation.name))
        .map(|r| {
            let o = &r.observation;
            TrendPoint {
                name: o.name.clone(),
                team: o.team.clone(),
                season: o.season,
                month: o.month,
                label: o.month_label(),
                pa: o.pa,
                value: metric.value(r),
            }
        })
        .collect();
    points.sort_by(|a, b| (&a.name, a.month).cmp(&(&b.name, b.month)));

    TrendView {
        metric,
        season: Some(season),
        months,
        candidates,
        players,
        points,
        baseline,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
