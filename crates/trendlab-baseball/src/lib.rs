// Monthly hitter metrics: loading, FWOBA, league baselines, trend views.

pub mod loader;
pub mod metrics;
pub mod observation;
pub mod trend;
pub mod usage;

pub use loader::{load_all, load_monthly_dir, LoadError};
pub use metrics::{compute_metric_table, Metric, MetricTable, ScoredObservation};
pub use observation::Observation;
pub use trend::{build_trend_view, TrendQuery, TrendView};
