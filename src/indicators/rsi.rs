// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// Step 1: Take the last `period` price changes (deltas).
// Step 2: avg_gain = mean of positive deltas, avg_loss = mean of |negative|
//          deltas, both over `period`.
// Step 3: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Edge cases are resolved explicitly rather than left to float arithmetic:
//   - fewer than `period + 1` closes      => RSI_NEUTRAL (50)
//   - avg_loss == 0 and avg_gain > 0      => 100
//   - avg_loss == 0 and avg_gain == 0     => RSI_NEUTRAL (flat market)
// =============================================================================

use super::RSI_NEUTRAL;

/// Zone label for an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn classify(rsi: f64, oversold: f64, overbought: f64) -> Self {
        if rsi < oversold {
            Self::Oversold
        } else if rsi > overbought {
            Self::Overbought
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
            Self::Overbought => write!(f, "overbought"),
        }
    }
}

/// True when `closes` is too short for an RSI of `period`.
pub fn is_warming_up(closes: &[f64], period: usize) -> bool {
    period == 0 || closes.len() < period + 1
}

/// RSI over the last `period` deltas of `closes`, always in `[0, 100]` for
/// finite input.
///
/// Returns `None` only for an empty slice.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.is_empty() {
        return None;
    }
    if is_warming_up(closes, period) {
        return Some(RSI_NEUTRAL);
    }

    let window = &closes[closes.len() - period - 1..];
    let (sum_gain, sum_loss) = window.windows(2).map(|w| w[1] - w[0]).fold(
        (0.0_f64, 0.0_f64),
        |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        },
    );

    let period_f = period as f64;
    Some(rsi_from_averages(sum_gain / period_f, sum_loss / period_f))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        RSI_NEUTRAL
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };

    if rsi.is_finite() {
        rsi.clamp(0.0, 100.0)
    } else {
        RSI_NEUTRAL
    }
}
