// League baselines: plate-appearance-weighted means of each rate metric
// across the whole loaded dataset.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Metric, ScoredObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BaselineError {
    /// No row has both PA > 0 and a computable value. Callers should omit
    /// the reference line rather than draw one at zero.
    #[error("no observations with plate appearances and a computable {metric} value")]
    EmptyDataset { metric: Metric },

    #[error("{metric} is a counting stat; baselines are defined for rate metrics only")]
    NotARateMetric { metric: Metric },
}

/// `Σ(value × PA) / Σ(PA)` over qualifying rows.
pub fn league_baseline(rows: &[ScoredObservation], metric: Metric) -> Result<f64, BaselineError> {
    if !metric.is_rate() {
        return Err(BaselineError::NotARateMetric { metric });
    }

    let (weighted, total_pa) = rows
        .iter()
        .filter(|row| row.observation.is_qualifying())
        .filter_map(|row| {
            let value = metric.value(row)?;
            value.is_finite().then_some((value, row.observation.pa as f64))
        })
        .fold((0.0, 0.0), |(sum, pa_sum), (value, pa)| {
            (sum + value * pa, pa_sum + pa)
        });

    if total_pa <= 0.0 {
        return Err(BaselineError::EmptyDataset { metric });
    }
    Ok(weighted / total_pa)
}

/// Baselines for every rate metric that has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LeagueBaselines {
    values: BTreeMap<Metric, f64>,
}

impl LeagueBaselines {
    /// Look up a baseline, reporting why it is missing.
    pub fn get(&self, metric: Metric) -> Result<f64, BaselineError> {
        if !metric.is_rate() {
            return Err(BaselineError::NotARateMetric { metric });
        }
        self.values
            .get(&metric)
            .copied()
            .ok_or(BaselineError::EmptyDataset { metric })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compute [`league_baseline`] for every rate metric; undefined ones are left out.
pub fn compute_baselines(rows: &[ScoredObservation]) -> LeagueBaselines {
    let values = Metric::ALL
        .into_iter()
        .filter(|m| m.is_rate())
        .filter_map(|m| league_baseline(rows, m).ok().map(|v| (m, v)))
        .collect();
    LeagueBaselines { values }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
