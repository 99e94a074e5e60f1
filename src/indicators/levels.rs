// Support / resistance heuristic.
//
//   support    = min(last N closes) * 0.995
//   resistance = max(last N closes) * 1.005
//
// Placeholder quality: a padded recent range, not a pivot or fractal
// detector.

use serde::{Deserialize, Serialize};

use super::{RESISTANCE_PREMIUM, SUPPORT_DISCOUNT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub support: f64,
    pub resistance: f64,
}

/// Padded min/max of the last `lookback` closes.  `None` only for empty input.
pub fn calculate_levels(closes: &[f64], lookback: usize) -> Option<Levels> {
    if closes.is_empty() {
        return None;
    }
    let n = lookback.max(1).min(closes.len());
    let window = &closes[closes.len() - n..];
    let low = window.iter().copied().fold(f64::INFINITY, f64::min);
    let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(Levels {
        support: low * SUPPORT_DISCOUNT,
        resistance: high * RESISTANCE_PREMIUM,
    })
}
