// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA = (close_{t-period+1} + ... + close_t) / period
//
// Insufficient-data policy: with fewer than `period` closes the most recent
// close is returned unchanged.  This is a deliberate degraded value, not an
// error; `IndicatorSet` records it in its warm-up list.
// =============================================================================

/// Arithmetic mean of the last `period` closes.
///
/// Returns `None` only for an empty slice.  With fewer than `period` closes
/// (or `period == 0`) the latest close is returned.
pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    let last = *closes.last()?;
    if period == 0 || closes.len() < period {
        return Some(last);
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
