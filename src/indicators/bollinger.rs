// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA(period), band = k * population σ of the last `period`
// closes, upper/lower = middle ± band.  Width is (upper - lower) / middle * 100
// and position is where the latest close sits inside the band (0-100 %).
//
// With fewer than `period` closes the middle band follows the SMA fallback
// (latest close) and σ is taken over whatever closes exist, so the ordering
// upper >= middle >= lower holds for any non-empty input.

use serde::{Deserialize, Serialize};

use super::sma::calculate_sma;

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Band width as a percentage of the middle band.
    pub width: f64,
    /// Position of the latest close within the band, 0 = lower, 100 = upper.
    /// May fall outside 0-100 when price breaks out of the band.
    pub position: f64,
}

/// Calculate Bollinger Bands.  `None` only for empty input.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerResult> {
    let close = *closes.last()?;
    let middle = calculate_sma(closes, period)?;

    let n = period.max(1).min(closes.len());
    let window = &closes[closes.len() - n..];
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let band = num_std.abs() * variance.sqrt();

    let upper = middle + band;
    let lower = middle - band;
    let width = if middle != 0.0 {
        (upper - lower) / middle * 100.0
    } else {
        0.0
    };
    let position = if upper > lower {
        (close - lower) / (upper - lower) * 100.0
    } else {
        50.0
    };

    Some(BollingerResult {
        upper,
        middle,
        lower,
        width,
        position,
    })
}
