// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
// True Range (TR) for each sample:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the plain mean of TR over the last `period` samples.  The very
// first sample of the series has no previous close, so its TR is H - L.
//
// OHLC fallback: when a sample carries no high/low, they are approximated as
// price * (1 ± OHLC_FALLBACK_FRACTION).  This only exists for price-only
// feeds and overstates nothing more than a 1 % intra-sample range.
// =============================================================================

use crate::market_data::Sample;

use super::OHLC_FALLBACK_FRACTION;

/// High of a sample, approximated from the price when missing.
pub fn effective_high(sample: &Sample) -> f64 {
    sample
        .high
        .unwrap_or(sample.price * (1.0 + OHLC_FALLBACK_FRACTION))
}

/// Low of a sample, approximated from the price when missing.
pub fn effective_low(sample: &Sample) -> f64 {
    sample
        .low
        .unwrap_or(sample.price * (1.0 - OHLC_FALLBACK_FRACTION))
}

/// True when any sample in the ATR window lacks a high or low.
pub fn uses_ohlc_fallback(samples: &[Sample], period: usize) -> bool {
    let n = period.max(1).min(samples.len());
    samples[samples.len() - n..]
        .iter()
        .any(|s| s.high.is_none() || s.low.is_none())
}

/// Mean true range over the last `period` samples (fewer if the series is
/// shorter).  `None` only for empty input.
pub fn calculate_atr(samples: &[Sample], period: usize) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let n = period.max(1).min(samples.len());
    let start = samples.len() - n;

    let sum: f64 = (start..samples.len())
        .map(|i| {
            let high = effective_high(&samples[i]);
            let low = effective_low(&samples[i]);
            let hl = high - low;
            match i.checked_sub(1).map(|p| samples[p].price) {
                Some(prev_close) => hl
                    .max((high - prev_close).abs())
                    .max((low - prev_close).abs()),
                None => hl,
            }
        })
        .sum();

    Some(sum / n as f64)
}

/// ATR as a percentage of the latest price.
pub fn calculate_atr_pct(samples: &[Sample], period: usize) -> Option<f64> {
    let atr = calculate_atr(samples, period)?;
    let last = samples.last()?.price;
    if last == 0.0 {
        return None;
    }
    Some(atr / last * 100.0)
}
