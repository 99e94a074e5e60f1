// =============================================================================
// Stochastic Oscillator and Williams %R
// =============================================================================
//
//   %K = (close - lowestLow) / (highestHigh - lowestLow) * 100
//   %D = %K * 0.9
//   %R = (highestHigh - close) / (highestHigh - lowestLow) * -100
//
// Highs and lows come from the sample's own high/low when present and from
// its price otherwise.  %D uses the same simplified smoothing as the MACD
// signal line instead of a 3-period SMA of %K.  A zero range returns the
// neutral constants.

use serde::{Deserialize, Serialize};

use crate::market_data::Sample;

use super::{STOCHASTIC_NEUTRAL, WILLIAMS_R_NEUTRAL};

/// Factor applied to %K in place of a 3-period %D average.
pub const STOCHASTIC_D_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticResult {
    pub k: f64,
    pub d: f64,
}

/// (highest high, lowest low, latest close) over the last `period` samples.
fn window_extremes(samples: &[Sample], period: usize) -> Option<(f64, f64, f64)> {
    let close = samples.last()?.price;
    let n = period.max(1).min(samples.len());
    let (hh, ll) = samples[samples.len() - n..].iter().fold(
        (f64::MIN, f64::MAX),
        |(hh, ll), s| {
            (
                hh.max(s.high.unwrap_or(s.price)),
                ll.min(s.low.unwrap_or(s.price)),
            )
        },
    );
    Some((hh, ll, close))
}

/// Stochastic oscillator.  `None` only for empty input.
pub fn calculate_stochastic(samples: &[Sample], period: usize) -> Option<StochasticResult> {
    let (hh, ll, close) = window_extremes(samples, period)?;
    let range = hh - ll;
    let k = if range > 0.0 {
        ((close - ll) / range * 100.0).clamp(0.0, 100.0)
    } else {
        STOCHASTIC_NEUTRAL
    };
    Some(StochasticResult {
        k,
        d: k * STOCHASTIC_D_FACTOR,
    })
}

/// Williams %R in `[-100, 0]`.  `None` only for empty input.
pub fn calculate_williams_r(samples: &[Sample], period: usize) -> Option<f64> {
    let (hh, ll, close) = window_extremes(samples, period)?;
    let range = hh - ll;
    if range > 0.0 {
        Some(((hh - close) / range * -100.0).clamp(-100.0, 0.0))
    } else {
        Some(WILLIAMS_R_NEUTRAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(prices: &[f64]) -> Vec<Sample> {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Sample::new(t0 + Duration::minutes(i as i64), p))
            .collect()
    }

    #[test]
    fn empty_is_none() {
        assert!(calculate_stochastic(&[], 14).is_none());
        assert!(calculate_williams_r(&[], 14).is_none());
    }

    #[test]
    fn close_at_high_of_range() {
        let samples = series(&[10.0, 12.0, 11.0, 14.0]);
        let st = calculate_stochastic(&samples, 14).unwrap();
        assert!((st.k - 100.0).abs() < 1e-12);
        assert!((st.d - 90.0).abs() < 1e-12);
        assert!(calculate_williams_r(&samples, 14).unwrap().abs() < 1e-12);
    }

    #[test]
    fn close_at_low_of_range() {
        let samples = series(&[14.0, 12.0, 11.0, 10.0]);
        assert!(calculate_stochastic(&samples, 14).unwrap().k.abs() < 1e-12);
        assert!((calculate_williams_r(&samples, 14).unwrap() + 100.0).abs() < 1e-12);
    }

    #[test]
    fn midpoint_close() {
        let samples = series(&[10.0, 20.0, 15.0]);
        assert!((calculate_stochastic(&samples, 14).unwrap().k - 50.0).abs() < 1e-12);
        assert!((calculate_williams_r(&samples, 14).unwrap() + 50.0).abs() < 1e-12);
    }

    #[test]
    fn flat_range_is_neutral() {
        let samples = series(&[100.0; 20]);
        assert_eq!(calculate_stochastic(&samples, 14).unwrap().k, STOCHASTIC_NEUTRAL);
        assert_eq!(calculate_williams_r(&samples, 14).unwrap(), WILLIAMS_R_NEUTRAL);
    }

    #[test]
    fn uses_sample_highs_and_lows() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let samples = vec![
            Sample::new(t0, 100.0).with_range(110.0, 90.0),
            Sample::new(t0 + Duration::minutes(1), 100.0).with_range(101.0, 99.0),
        ];
        let st = calculate_stochastic(&samples, 14).unwrap();
        assert!((st.k - 50.0).abs() < 1e-12);
    }
}
