// FWOBA: fantasy-category weighted rate per PA, standardized across the
// dataset and rescaled onto the wOBA scale.

use serde::Serialize;
use tracing::warn;
use trendlab_core::config::{FwobaConfig, FwobaWeights};

use crate::observation::Observation;

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and population standard deviation of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Compute mean and standard deviation for a slice of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty slice. Uses the
/// population standard deviation (N denominator): the dataset is the whole
/// universe being rescaled, not a sample of it.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

// ---------------------------------------------------------------------------
// Raw score
// ---------------------------------------------------------------------------

/// Weighted fantasy-category total per plate appearance.
///
/// `None` for rows without a plate appearance.
pub fn raw_score(obs: &Observation, weights: &FwobaWeights) -> Option<f64> {
    if !obs.is_qualifying() {
        return None;
    }
    let weighted = weights.h * obs.h as f64
        + weights.r * obs.r as f64
        + weights.doubles * obs.doubles as f64
        + weights.hr * obs.hr as f64
        + weights.sb * obs.sb as f64
        + weights.bb * obs.bb as f64
        + weights.rbi * obs.rbi as f64
        + weights.k * obs.k as f64;
    Some(weighted / obs.pa as f64)
}

// ---------------------------------------------------------------------------
// Standardization
// ---------------------------------------------------------------------------

/// Dataset-wide mean/stdev of the raw score. Produced fresh by
/// [`fit_standardization`] for each dataset and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Standardization {
    /// Number of rows the raw stats were computed over.
    pub population: usize,
    pub raw: PoolStats,
}

impl Standardization {
    /// Zero spread (or an empty population): z-scores are undefined and every
    /// row maps to the target mean.
    pub fn is_degenerate(&self) -> bool {
        self.population == 0 || self.raw.stdev < STDEV_EPSILON
    }

    /// Map a raw score onto the target distribution. Unclamped.
    pub fn rescale(&self, raw: f64, config: &FwobaConfig) -> f64 {
        if self.is_degenerate() {
            return config.target_mean;
        }
        let z = (raw - self.raw.mean) / self.raw.stdev;
        config.target_mean + z * config.target_stdev
    }
}

/// Fit the standardization over every row with at least
/// `min_pa_for_distribution` plate appearances (and never fewer than one).
pub fn fit_standardization(observations: &[Observation], config: &FwobaConfig) -> Standardization {
    let min_pa = config.min_pa_for_distribution.max(1);
    let raws: Vec<f64> = observations
        .iter()
        .filter(|o| o.pa >= min_pa)
        .filter_map(|o| raw_score(o, &config.weights))
        .collect();

    let standardization = Standardization {
        population: raws.len(),
        raw: compute_pool_stats(&raws),
    };
    if standardization.is_degenerate() && !observations.is_empty() {
        warn!(
            "degenerate FWOBA standardization ({} rows, stdev {:.3e}); every row maps to {:.3}",
            standardization.population, standardization.raw.stdev, config.target_mean
        );
    }
    standardization
}

/// FWOBA for one row against an already-fitted standardization.
pub fn fwoba(obs: &Observation, standardization: &Standardization, config: &FwobaConfig) -> Option<f64> {
    raw_score(obs, &config.weights).map(|raw| standardization.rescale(raw, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
