// =============================================================================
// Exponential Moving Average (EMA) — seeded at the first close of the slice
// =============================================================================
//
// Formula:
//   k      = 2 / (period + 1)
//   EMA_0  = close_0                         (first close of the given slice)
//   EMA_t  = (close_t - EMA_{t-1}) * k + EMA_{t-1}
//
// This is an approximation of a textbook EMA: the seed is whatever close
// happens to open the slice, not the SMA of the first `period` closes, so the
// value depends on how much history is passed in.  Signals downstream were
// tuned against this behaviour, so it is kept as is.
// =============================================================================

/// Compute the EMA series, one value per close.
///
/// Returns an empty `Vec` for empty input.  `period == 0` is treated as 1
/// (k = 1, the series tracks the closes exactly).
pub fn calculate_ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    let Some(&seed) = closes.first() else {
        return Vec::new();
    };
    let k = 2.0 / (period.max(1) as f64 + 1.0);

    let mut result = Vec::with_capacity(closes.len());
    let mut prev = seed;
    result.push(prev);
    for &close in &closes[1..] {
        prev = (close - prev) * k + prev;
        result.push(prev);
    }
    result
}

/// Final EMA value over the whole slice, or `None` for empty input.
pub fn calculate_ema(closes: &[f64], period: usize) -> Option<f64> {
    calculate_ema_series(closes, period).last().copied()
}
