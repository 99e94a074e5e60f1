use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single price observation. `volume`, `high` and `low` are optional; the
/// indicator library falls back to documented approximations without them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
}

impl Sample {
    /// Price-only sample.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price,
            volume: None,
            high: None,
            low: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    /// Check the per-sample invariants: finite positive price, non-negative
    /// volume, and `high >= price >= low` when both bounds are present.
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(EngineError::validation(format!(
                "sample price must be a positive finite number, got {}",
                self.price
            )));
        }
        if let Some(v) = self.volume {
            if !v.is_finite() || v < 0.0 {
                return Err(EngineError::validation(format!(
                    "sample volume must be non-negative and finite, got {v}"
                )));
            }
        }
        for (name, bound) in [("high", self.high), ("low", self.low)] {
            if let Some(b) = bound {
                if !b.is_finite() {
                    return Err(EngineError::validation(format!(
                        "sample {name} must be finite, got {b}"
                    )));
                }
            }
        }
        if let (Some(high), Some(low)) = (self.high, self.low) {
            if !(high >= self.price && self.price >= low) {
                return Err(EngineError::validation(format!(
                    "sample range violated: high {high} >= price {} >= low {low}",
                    self.price
                )));
            }
        }
        Ok(())
    }
}

/// Check a caller-supplied snapshot: every sample valid and timestamps
/// strictly increasing.  Snapshots taken from a [`SeriesBuffer`] always pass.
pub fn validate_series(samples: &[Sample]) -> Result<()> {
    for (i, sample) in samples.iter().enumerate() {
        sample.validate().map_err(|e| match e {
            EngineError::Validation(msg) => EngineError::validation(format!("sample {i}: {msg}")),
            other => other,
        })?;
    }
    if let Some(w) = samples.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
        return Err(EngineError::validation(format!(
            "sample timestamps must strictly increase: {} follows {}",
            w[1].timestamp, w[0].timestamp
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SeriesBuffer -- bounded ring for one instrument
// ---------------------------------------------------------------------------

/// Fixed-capacity ring of samples for one instrument.
///
/// One feed appends; any number of readers take snapshots.  A snapshot is a
/// clone taken under the read lock, so it is always a consistent prefix of
/// the appended history and never observes a half-applied push.
pub struct SeriesBuffer {
    ring: RwLock<VecDeque<Sample>>,
    capacity: usize,
}

impl SeriesBuffer {
    /// Create a buffer that retains at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::config("series capacity must be at least 1"));
        }
        Ok(Self::with_capacity(capacity))
    }

    /// Caller guarantees `capacity > 0`.
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    ///
    /// Rejects invalid samples and non-increasing timestamps; the buffer is
    /// left untouched on error.
    pub fn push(&self, sample: Sample) -> Result<()> {
        sample.validate()?;

        let mut ring = self.ring.write();
        if let Some(last) = ring.back() {
            if sample.timestamp <= last.timestamp {
                return Err(EngineError::validation(format!(
                    "sample timestamp {} is not after last timestamp {}",
                    sample.timestamp, last.timestamp
                )));
            }
        }
        ring.push_back(sample);
        while ring.len() > self.capacity {
            ring.pop_front();
        }
        Ok(())
    }

    /// Copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.ring.read().iter().cloned().collect()
    }

    /// Price of the most recent sample, if any.
    pub fn last_price(&self) -> Option<f64> {
        self.ring.read().back().map(|s| s.price)
    }

    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for SeriesBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SeriesStore -- one buffer per symbol
// ---------------------------------------------------------------------------

/// Thread-safe map of per-symbol series buffers, all sharing one capacity.
pub struct SeriesStore {
    buffers: RwLock<HashMap<String, Arc<SeriesBuffer>>>,
    capacity: usize,
}

impl SeriesStore {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::config("series capacity must be at least 1"));
        }
        Ok(Self {
            buffers: RwLock::new(HashMap::new()),
            capacity,
        })
    }

    /// Buffer for `symbol`, created on first use.
    pub fn buffer(&self, symbol: &str) -> Arc<SeriesBuffer> {
        if let Some(buf) = self.buffers.read().get(symbol) {
            return buf.clone();
        }
        let mut map = self.buffers.write();
        map.entry(symbol.to_string())
            .or_insert_with(|| {
                debug!(symbol, capacity = self.capacity, "creating series buffer");
                Arc::new(SeriesBuffer::with_capacity(self.capacity))
            })
            .clone()
    }

    /// Append a sample to the series for `symbol`.
    pub fn push(&self, symbol: &str, sample: Sample) -> Result<()> {
        self.buffer(symbol).push(sample).map_err(|e| {
            warn!(symbol, error = %e, "sample rejected");
            e
        })
    }

    /// Snapshot of the series for `symbol`; empty when the symbol is unknown.
    pub fn snapshot(&self, symbol: &str) -> Vec<Sample> {
        self.buffers
            .read()
            .get(symbol)
            .map(|b| b.snapshot())
            .unwrap_or_default()
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.buffers.read().keys().cloned().collect();
        out.sort();
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(i)
    }

    #[test]
    fn ring_evicts_oldest() {
        let buf = SeriesBuffer::new(3).unwrap();
        for i in 0..5 {
            buf.push(Sample::new(ts(i), 100.0 + i as f64)).unwrap();
        }
        assert_eq!(buf.len(), 3);
        let prices: Vec<f64> = buf.snapshot().iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![102.0, 103.0, 104.0]);
        assert_eq!(buf.last_price(), Some(104.0));
    }

    #[test]
    fn zero_capacity_is_config_error() {
        assert!(matches!(SeriesBuffer::new(0), Err(EngineError::Config(_))));
        assert!(matches!(SeriesStore::new(0), Err(EngineError::Config(_))));
    }

    #[test]
    fn rejects_non_increasing_timestamp() {
        let buf = SeriesBuffer::new(10).unwrap();
        buf.push(Sample::new(ts(1), 100.0)).unwrap();
        let err = buf.push(Sample::new(ts(1), 101.0)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(buf.push(Sample::new(ts(0), 101.0)).is_err());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn rejects_bad_prices_and_ranges() {
        let buf = SeriesBuffer::new(10).unwrap();
        assert!(buf.push(Sample::new(ts(0), 0.0)).is_err());
        assert!(buf.push(Sample::new(ts(0), -5.0)).is_err());
        assert!(buf.push(Sample::new(ts(0), f64::NAN)).is_err());
        assert!(buf
            .push(Sample::new(ts(0), 100.0).with_range(99.0, 98.0))
            .is_err());
        assert!(buf
            .push(Sample::new(ts(0), 100.0).with_volume(-1.0))
            .is_err());
        assert!(buf.is_empty());
        buf.push(Sample::new(ts(0), 100.0).with_range(101.0, 99.0))
            .unwrap();
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_pushes() {
        let buf = SeriesBuffer::new(10).unwrap();
        buf.push(Sample::new(ts(0), 100.0)).unwrap();
        let snap = buf.snapshot();
        buf.push(Sample::new(ts(1), 101.0)).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn concurrent_snapshots_see_consistent_prefix() {
        let buf = Arc::new(SeriesBuffer::new(1_000).unwrap());
        let writer = {
            let buf = buf.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    buf.push(Sample::new(ts(i), 100.0 + i as f64)).unwrap();
                }
            })
        };
        for _ in 0..50 {
            let snap = buf.snapshot();
            for (i, s) in snap.iter().enumerate() {
                assert!((s.price - (100.0 + i as f64)).abs() < 1e-12);
            }
        }
        writer.join().unwrap();
        assert_eq!(buf.len(), 500);
    }

    #[test]
    fn store_keeps_symbols_apart() {
        let store = SeriesStore::new(5).unwrap();
        store.push("AAPL", Sample::new(ts(0), 190.0)).unwrap();
        store.push("MSFT", Sample::new(ts(0), 410.0)).unwrap();
        store.push("AAPL", Sample::new(ts(1), 191.0)).unwrap();
        assert_eq!(store.snapshot("AAPL").len(), 2);
        assert_eq!(store.snapshot("MSFT").len(), 1);
        assert!(store.snapshot("TSLA").is_empty());
        assert_eq!(store.symbols(), vec!["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(store.buffer("AAPL").capacity(), 5);
    }

    #[test]
    fn validate_series_checks_values_and_order() {
        let good = vec![Sample::new(ts(0), 100.0), Sample::new(ts(1), 101.0)];
        assert!(validate_series(&good).is_ok());
        assert!(validate_series(&[]).is_ok());

        let bad_price = vec![Sample::new(ts(0), 100.0), Sample::new(ts(1), f64::NAN)];
        assert!(matches!(validate_series(&bad_price), Err(EngineError::Validation(_))));

        let backwards = vec![Sample::new(ts(5), 100.0), Sample::new(ts(0), 99.0)];
        assert!(matches!(validate_series(&backwards), Err(EngineError::Validation(_))));

        let repeated = vec![Sample::new(ts(1), 100.0), Sample::new(ts(1), 99.0)];
        assert!(validate_series(&repeated).is_err());
    }

    #[test]
    fn store_buffers_share_the_store_capacity() {
        let store = SeriesStore::new(3).unwrap();
        let buf = store.buffer("AAPL");
        assert_eq!(buf.capacity(), 3);
        assert!(Arc::ptr_eq(&buf, &store.buffer("AAPL")));
        for i in 0..5 {
            store.push("AAPL", Sample::new(ts(i), 100.0 + i as f64)).unwrap();
        }
        assert_eq!(store.snapshot("AAPL").len(), 3);
    }

    #[test]
    fn sample_json_omits_missing_fields() {
        let s = Sample::new(ts(0), 100.0);
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("volume"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
