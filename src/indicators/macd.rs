// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   line      = EMA(12) - EMA(26)
//   signal    = line * 0.9
//   histogram = line - signal
//
// The signal line is a simplified stand-in for a 9-period EMA of the MACD
// line.  It is an approximation and is kept because the traditional signal
// generator's thresholds were set against it.

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
/// Factor applied to the MACD line in place of a 9-period signal EMA.
pub const MACD_SIGNAL_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD over the full slice.  `None` only for empty input.
pub fn calculate_macd(closes: &[f64]) -> Option<MacdResult> {
    let fast = calculate_ema(closes, MACD_FAST)?;
    let slow = calculate_ema(closes, MACD_SLOW)?;
    let line = fast - slow;
    let signal = line * MACD_SIGNAL_FACTOR;
    Some(MacdResult {
        line,
        signal,
        histogram: line - signal,
    })
}
