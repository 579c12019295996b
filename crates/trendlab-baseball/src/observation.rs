// Player-month batting observations as delivered by the loader.

use serde::Serialize;

/// Months a regular season covers, in calendar order.
pub const SEASON_MONTHS: [u8; 6] = [4, 5, 6, 7, 8, 9];

/// One hitter's batting line for one calendar month of one season.
///
/// Observations are read-only inputs: the metric engine derives new values
/// alongside them and never rewrites the counting stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub name: String,
    pub team: String,
    pub season: i32,
    pub month: u8,
    pub pa: u32,
    pub h: u32,
    pub r: u32,
    pub doubles: u32,
    pub hr: u32,
    pub sb: u32,
    pub bb: u32,
    pub rbi: u32,
    pub k: u32,
    /// Box-score detail only needed to approximate wOBA/OPS/AVG.
    pub components: BattingComponents,
    /// Real advanced metrics carried through from the source file. The rates
    /// the metric engine may rebuild are exported under `file_*` so they never
    /// collide with the derived values on a scored row.
    #[serde(rename = "file_woba")]
    pub woba: Option<f64>,
    #[serde(rename = "file_ops")]
    pub ops: Option<f64>,
    #[serde(rename = "file_avg")]
    pub avg: Option<f64>,
    pub xwoba: Option<f64>,
    /// FanGraphs WAR for the month.
    pub fwar: Option<f64>,
}

/// Optional batting components. `None` means the column was absent or blank
/// in the source file, which is different from a recorded zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BattingComponents {
    pub ab: Option<u32>,
    pub singles: Option<u32>,
    pub triples: Option<u32>,
    pub ibb: Option<u32>,
    pub hbp: Option<u32>,
    pub sf: Option<u32>,
}

impl Observation {
    /// Rows with at least one plate appearance take part in standardization
    /// and baseline weighting.
    pub fn is_qualifying(&self) -> bool {
        self.pa > 0
    }

    /// Three-letter month label ("Apr", "May", ...).
    pub fn month_label(&self) -> Option<&'static str> {
        month_label(self.month)
    }

    /// Sort key used everywhere observations are ordered.
    pub fn sort_key(&self) -> (i32, u8, &str) {
        (self.season, self.month, self.name.as_str())
    }
}

/// Short label for a calendar month number, `None` outside 1..=12.
pub fn month_label(month: u8) -> Option<&'static str> {
    chrono::Month::try_from(month)
        .ok()
        .map(|m| m.name().get(..3).unwrap_or(m.name()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A hitter month with every counting stat zeroed except PA.
    pub fn blank(name: &str, season: i32, month: u8, pa: u32) -> Observation {
        Observation {
            name: name.into(),
            team: "TST".into(),
            season,
            month,
            pa,
            h: 0,
            r: 0,
            doubles: 0,
            hr: 0,
            sb: 0,
            bb: 0,
            rbi: 0,
            k: 0,
            components: BattingComponents::default(),
            woba: None,
            ops: None,
            avg: None,
            xwoba: None,
            fwar: None,
        }
    }

    /// A hitter month whose only non-zero counting stat is hits.
    pub fn with_hits(name: &str, pa: u32, h: u32) -> Observation {
        Observation {
            h,
            ..blank(name, 2024, 5, pa)
        }
    }
}
