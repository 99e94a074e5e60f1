pub mod series_buffer;

// Re-export for convenient access (e.g. `use crate::market_data::Sample`).
pub use series_buffer::{validate_series, Sample, SeriesBuffer, SeriesStore};
