// =============================================================================
// Volume-based indicators: VWAP and relative volume
// =============================================================================
//
// VWAP = Σ(price * volume) / Σ(volume) over every supplied sample.  Samples
// without volume are counted at DEFAULT_VOLUME, which turns the VWAP of a
// price-only feed into a plain mean instead of failing.

use crate::market_data::Sample;

use super::DEFAULT_VOLUME;

/// Volume-weighted average price.  `None` only for empty input; a zero total
/// volume returns the latest price.
pub fn calculate_vwap(samples: &[Sample]) -> Option<f64> {
    let last = samples.last()?.price;
    let (pv, vol) = samples.iter().fold((0.0_f64, 0.0_f64), |(pv, vol), s| {
        let v = s.volume.unwrap_or(DEFAULT_VOLUME);
        (pv + s.price * v, vol + v)
    });
    if vol > 0.0 {
        Some(pv / vol)
    } else {
        Some(last)
    }
}

/// True when any sample lacks a volume reading.
pub fn uses_default_volume(samples: &[Sample]) -> bool {
    samples.iter().any(|s| s.volume.is_none())
}

/// Latest volume divided by the mean volume of the last `period` samples.
///
/// `None` when the latest sample has no volume, or the window mean is zero.
/// Samples without volume are skipped from the mean.
pub fn calculate_volume_ratio(samples: &[Sample], period: usize) -> Option<f64> {
    let latest = samples.last()?.volume?;
    let n = period.max(1).min(samples.len());
    let vols: Vec<f64> = samples[samples.len() - n..]
        .iter()
        .filter_map(|s| s.volume)
        .collect();
    let mean = vols.iter().sum::<f64>() / vols.len() as f64;
    if mean > 0.0 {
        Some(latest / mean)
    } else {
        None
    }
}
