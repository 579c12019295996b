// Approximate real-world rate stats for source files that lack them.
//
// A value present in the file always wins. Otherwise the rate is rebuilt from
// box-score components; when a component column is missing the rate is left
// undefined instead of treating the gap as zero.

use trendlab_core::config::WobaWeights;

use crate::observation::Observation;

/// Singles, from the 1B column or from H - 2B - 3B - HR.
pub fn singles(obs: &Observation) -> Option<u32> {
    if let Some(s) = obs.components.singles {
        return Some(s);
    }
    let triples = obs.components.triples?;
    obs.h
        .checked_sub(obs.doubles)?
        .checked_sub(triples)?
        .checked_sub(obs.hr)
}

fn ratio(num: f64, denom: f64) -> Option<f64> {
    (denom > 0.0).then(|| num / denom)
}

// Sums run in f64: a single count may be anywhere in u32 range.
fn total(counts: &[u32]) -> f64 {
    counts.iter().map(|&n| n as f64).sum()
}

/// Batting average: file value, else H / AB.
pub fn avg(obs: &Observation) -> Option<f64> {
    obs.avg
        .or_else(|| ratio(obs.h as f64, obs.components.ab? as f64))
}

/// (H + BB + HBP) / (AB + BB + HBP + SF)
pub fn obp(obs: &Observation) -> Option<f64> {
    let c = &obs.components;
    let (ab, hbp, sf) = (c.ab?, c.hbp?, c.sf?);
    ratio(total(&[obs.h, obs.bb, hbp]), total(&[ab, obs.bb, hbp, sf]))
}

/// Total bases / AB
pub fn slg(obs: &Observation) -> Option<f64> {
    let ab = obs.components.ab?;
    let triples = obs.components.triples?;
    let tb = singles(obs)? as f64
        + 2.0 * obs.doubles as f64
        + 3.0 * triples as f64
        + 4.0 * obs.hr as f64;
    ratio(tb, ab as f64)
}

/// OPS: file value, else OBP + SLG.
pub fn ops(obs: &Observation) -> Option<f64> {
    obs.ops.or_else(|| Some(obp(obs)? + slg(obs)?))
}

/// wOBA: file value, else the fixed-weight approximation.
pub fn woba(obs: &Observation, weights: &WobaWeights) -> Option<f64> {
    if obs.woba.is_some() {
        return obs.woba;
    }
    let c = &obs.components;
    let (ab, ibb, hbp, sf, triples) = (c.ab?, c.ibb?, c.hbp?, c.sf?, c.triples?);
    let ubb = obs.bb.saturating_sub(ibb);
    let num = weights.ubb * ubb as f64
        + weights.hbp * hbp as f64
        + weights.single * singles(obs)? as f64
        + weights.double * obs.doubles as f64
        + weights.triple * triples as f64
        + weights.hr * obs.hr as f64;
    ratio(num, total(&[ab, ubb, sf, hbp]))
}
