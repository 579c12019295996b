// Metric engine: derived per-row rates and the league baselines built on them.

pub mod baseline;
pub mod derived;
pub mod fwoba;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use trendlab_core::Config;

use crate::observation::Observation;

pub use baseline::{compute_baselines, league_baseline, BaselineError, LeagueBaselines};
pub use fwoba::{fit_standardization, Standardization};

// ---------------------------------------------------------------------------
// Metric identifiers
// ---------------------------------------------------------------------------

/// A column a trend line can be drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    #[serde(rename = "FWOBA")]
    Fwoba,
    #[serde(rename = "wOBA")]
    Woba,
    #[serde(rename = "OPS")]
    Ops,
    #[serde(rename = "AVG")]
    Avg,
    #[serde(rename = "xwOBA")]
    Xwoba,
    #[serde(rename = "PA")]
    Pa,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "H")]
    H,
    #[serde(rename = "2B")]
    Doubles,
    #[serde(rename = "HR")]
    Hr,
    #[serde(rename = "RBI")]
    Rbi,
    #[serde(rename = "SB")]
    Sb,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "fWAR")]
    Fwar,
}

impl Metric {
    pub const ALL: [Metric; 15] = [
        Metric::Fwoba,
        Metric::Woba,
        Metric::Ops,
        Metric::Avg,
        Metric::Xwoba,
        Metric::Pa,
        Metric::R,
        Metric::H,
        Metric::Doubles,
        Metric::Hr,
        Metric::Rbi,
        Metric::Sb,
        Metric::Bb,
        Metric::K,
        Metric::Fwar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Fwoba => "FWOBA",
            Metric::Woba => "wOBA",
            Metric::Ops => "OPS",
            Metric::Avg => "AVG",
            Metric::Xwoba => "xwOBA",
            Metric::Pa => "PA",
            Metric::R => "R",
            Metric::H => "H",
            Metric::Doubles => "2B",
            Metric::Hr => "HR",
            Metric::Rbi => "RBI",
            Metric::Sb => "SB",
            Metric::Bb => "BB",
            Metric::K => "K",
            Metric::Fwar => "fWAR",
        }
    }

    /// Per-PA rates get a league baseline; counting stats do not.
    pub fn is_rate(self) -> bool {
        matches!(
            self,
            Metric::Fwoba | Metric::Woba | Metric::Ops | Metric::Avg | Metric::Xwoba
        )
    }

    /// Value of this metric on a scored row, `None` when not computable.
    pub fn value(self, row: &ScoredObservation) -> Option<f64> {
        let obs = &row.observation;
        let count = |n: u32| Some(n as f64);
        match self {
            Metric::Fwoba => row.fwoba,
            Metric::Woba => row.woba,
            Metric::Ops => row.ops,
            Metric::Avg => row.avg,
            Metric::Xwoba => obs.xwoba,
            Metric::Pa => count(obs.pa),
            Metric::R => count(obs.r),
            Metric::H => count(obs.h),
            Metric::Doubles => count(obs.doubles),
            Metric::Hr => count(obs.hr),
            Metric::Rbi => count(obs.rbi),
            Metric::Sb => count(obs.sb),
            Metric::Bb => count(obs.bb),
            Metric::K => count(obs.k),
            Metric::Fwar => obs.fwar,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}`")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Case-insensitive; `SO` is accepted for strikeouts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("SO") {
            return Ok(Metric::K);
        }
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scored rows and the computed table
// ---------------------------------------------------------------------------

/// An observation plus every value derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub fwoba_raw: Option<f64>,
    pub fwoba: Option<f64>,
    pub woba: Option<f64>,
    pub ops: Option<f64>,
    pub avg: Option<f64>,
}

/// Everything the presentation layer needs for one loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTable {
    pub rows: Vec<ScoredObservation>,
    pub standardization: Standardization,
    pub baselines: LeagueBaselines,
}

impl MetricTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the metric engine and the baseline engine over a dataset.
///
/// Pure: call it again whenever the dataset or the configuration changes.
/// Row order follows the input.
pub fn compute_metric_table(observations: &[Observation], config: &Config) -> MetricTable {
    let fw = &config.fwoba;
    let standardization = fit_standardization(observations, fw);

    let rows: Vec<ScoredObservation> = observations
        .iter()
        .map(|obs| {
            let raw = fwoba::raw_score(obs, &fw.weights);
            ScoredObservation {
                fwoba_raw: raw,
                fwoba: raw.map(|r| standardization.rescale(r, fw)),
                woba: derived::woba(obs, &config.woba),
                ops: derived::ops(obs),
                avg: derived::avg(obs),
                observation: obs.clone(),
            }
        })
        .collect();

    let baselines = compute_baselines(&rows);
    info!(
        "Computed metrics for {} rows ({} in FWOBA population, {} baselines defined)",
        rows.len(),
        standardization.population,
        baselines.len()
    );

    MetricTable {
        rows,
        standardization,
        baselines,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::test_support::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for m in Metric::ALL {
            assert_eq!(m.as_str().parse::<Metric>().unwrap(), m);
        }
    }

    #[test]
    fn metric_parsing_is_case_insensitive() {
        assert_eq!("fwoba".parse::<Metric>().unwrap(), Metric::Fwoba);
        assert_eq!("WOBA".parse::<Metric>().unwrap(), Metric::Woba);
        assert_eq!(" 2b ".parse::<Metric>().unwrap(), Metric::Doubles);
        assert_eq!("so".parse::<Metric>().unwrap(), Metric::K);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = "WAR".parse::<Metric>().unwrap_err();
        assert_eq!(err, UnknownMetric("WAR".into()));
    }

    #[test]
    fn rate_metrics() {
        let rates: Vec<_> = Metric::ALL.into_iter().filter(|m| m.is_rate()).collect();
        assert_eq!(
            rates,
            vec![Metric::Fwoba, Metric::Woba, Metric::Ops, Metric::Avg, Metric::Xwoba]
        );
    }

    #[test]
    fn table_keeps_input_order_and_raw_counts() {
        let rows = vec![
            with_hits("B", 100, 30),
            blank("Z", 2024, 5, 0),
            with_hits("A", 100, 20),
        ];
        let table = compute_metric_table(&rows, &Config::default());
        let names: Vec<_> = table.rows.iter().map(|r| r.observation.name.as_str()).collect();
        assert_eq!(names, vec!["B", "Z", "A"]);
        for (scored, original) in table.rows.iter().zip(&rows) {
            assert_eq!(&scored.observation, original);
        }
    }

    #[test]
    fn zero_pa_row_is_not_computable() {
        let rows = vec![with_hits("A", 100, 20), blank("Z", 2024, 5, 0), with_hits("B", 100, 30)];
        let table = compute_metric_table(&rows, &Config::default());
        assert_eq!(table.rows[1].fwoba, None);
        assert_eq!(table.rows[1].fwoba_raw, None);
        assert_eq!(Metric::Fwoba.value(&table.rows[1]), None);
        // Counting stats are still reported as-is.
        assert_eq!(Metric::Pa.value(&table.rows[1]), Some(0.0));
    }

    #[test]
    fn equal_raw_scores_give_target_mean_everywhere() {
        let rows = vec![with_hits("A", 100, 25), with_hits("B", 200, 50), with_hits("C", 400, 100)];
        let table = compute_metric_table(&rows, &Config::default());
        assert!(table.standardization.is_degenerate());
        for row in &table.rows {
            assert_eq!(row.fwoba, Some(0.320));
        }
        assert!(approx_eq(table.baselines.get(Metric::Fwoba).unwrap(), 0.320, 1e-12));
    }

    #[test]
    fn removing_zero_pa_rows_changes_nothing_else() {
        let kept = vec![with_hits("A", 90, 20), with_hits("B", 110, 35), with_hits("C", 70, 12)];
        let mut padded = kept.clone();
        padded.insert(1, blank("Bench", 2024, 5, 0));
        padded.push(blank("IL", 2024, 6, 0));

        let lean = compute_metric_table(&kept, &Config::default());
        let full = compute_metric_table(&padded, &Config::default());

        let full_kept: Vec<_> = full
            .rows
            .iter()
            .filter(|r| r.observation.pa > 0)
            .cloned()
            .collect();
        assert_eq!(full_kept, lean.rows);
        assert_eq!(full.standardization, lean.standardization);
        assert_eq!(full.baselines, lean.baselines);
    }

    #[test]
    fn recomputation_reflects_the_new_dataset() {
        let config = Config::default();
        let first = compute_metric_table(&[with_hits("A", 100, 20), with_hits("B", 100, 30)], &config);
        let second = compute_metric_table(&[with_hits("A", 100, 20), with_hits("B", 100, 60)], &config);
        assert_ne!(first.standardization, second.standardization);
        // A is the low row in both datasets and the spread is symmetric, so it
        // lands on the same z-score.
        assert!(approx_eq(
            first.rows[0].fwoba.unwrap(),
            second.rows[0].fwoba.unwrap(),
            1e-12
        ));
    }

    #[test]
    fn scored_row_serializes_each_key_once() {
        let obs = Observation {
            h: 25,
            doubles: 5,
            hr: 4,
            bb: 9,
            components: crate::observation::BattingComponents {
                ab: Some(88),
                singles: Some(15),
                triples: Some(1),
                ibb: Some(1),
                hbp: Some(2),
                sf: Some(1),
            },
            ..blank("Line Drive", 2024, 7, 100)
        };
        let table = compute_metric_table(&[obs], &Config::default());
        let json = serde_json::to_string(&table.rows[0]).unwrap();

        for key in ["name", "pa", "fwoba", "woba", "ops", "avg", "file_woba", "file_ops", "file_avg"] {
            let needle = format!("\"{key}\":");
            assert_eq!(json.matches(&needle).count(), 1, "key `{key}` in {json}");
        }
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["file_woba"].is_null());
        assert!(value["woba"].is_number());
        assert!(value["avg"].is_number());
    }

    #[test]
    fn huge_counts_score_without_panicking() {
        let rows = vec![
            Observation {
                hr: 2_000_000_000,
                doubles: 2_000_000_000,
                components: crate::observation::BattingComponents {
                    ab: Some(100),
                    singles: Some(0),
                    triples: Some(0),
                    ..Default::default()
                },
                ..blank("Typo", 2024, 5, 100)
            },
            with_hits("A", 100, 20),
        ];
        let table = compute_metric_table(&rows, &Config::default());
        assert!(table.rows[0].fwoba.unwrap() > table.rows[1].fwoba.unwrap());
        assert!(table.rows[0].avg.unwrap().is_finite());
    }
}
