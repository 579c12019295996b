// Playing-time context: monthly PA passed through with a full-time flag.

use serde::Serialize;
use trendlab_core::config::UsageConfig;

use crate::observation::Observation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayingTimePoint {
    pub season: i32,
    pub month: u8,
    pub label: Option<&'static str>,
    pub pa: u32,
    pub full_time: bool,
}

pub fn is_full_time(pa: u32, usage: &UsageConfig) -> bool {
    pa >= usage.full_time_pa
}

/// One point per month the player appears in, ordered by (season, month).
/// Names match exactly.
pub fn playing_time(
    observations: &[Observation],
    player: &str,
    usage: &UsageConfig,
) -> Vec<PlayingTimePoint> {
    let mut points: Vec<PlayingTimePoint> = observations
        .iter()
        .filter(|o| o.name == player)
        .map(|o| PlayingTimePoint {
            season: o.season,
            month: o.month,
            label: o.month_label(),
            pa: o.pa,
            full_time: is_full_time(o.pa, usage),
        })
        .collect();
    points.sort_by_key(|p| (p.season, p.month));
    points
}
