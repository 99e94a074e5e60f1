// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions shared by every consumer of the
// engine.  Every function returns `Option<T>`, and `None` means exactly one
// thing: the input was empty.  Short input never fails; each indicator
// degrades to the documented fallback below, and `IndicatorSet` lists which
// indicators are running on a fallback so callers can tell them apart from
// fully warmed-up values.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod levels;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::market_data::Sample;

pub use bollinger::BollingerResult;
pub use levels::Levels;
pub use macd::MacdResult;
pub use stochastic::StochasticResult;

// ---------------------------------------------------------------------------
// Fallback constants
// ---------------------------------------------------------------------------

/// RSI reported when there are not enough deltas, or no movement at all.
pub const RSI_NEUTRAL: f64 = 50.0;
/// %K reported when the high-low range is zero.
pub const STOCHASTIC_NEUTRAL: f64 = 50.0;
/// Williams %R reported when the high-low range is zero.
pub const WILLIAMS_R_NEUTRAL: f64 = -50.0;
/// Volume assumed for samples that carry none (VWAP only).
pub const DEFAULT_VOLUME: f64 = 1_000_000.0;
/// Half-range used to approximate high/low from price for ATR.
pub const OHLC_FALLBACK_FRACTION: f64 = 0.005;
pub const SUPPORT_DISCOUNT: f64 = 0.995;
pub const RESISTANCE_PREMIUM: f64 = 1.005;
pub const LEVELS_LOOKBACK: usize = 20;

// ---------------------------------------------------------------------------
// Look-back periods
// ---------------------------------------------------------------------------

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD: f64 = 2.0;
pub const ATR_PERIOD: usize = 14;
pub const STOCHASTIC_PERIOD: usize = 14;
pub const WILLIAMS_R_PERIOD: usize = 14;
pub const VOLUME_RATIO_PERIOD: usize = 20;

// ---------------------------------------------------------------------------
// IndicatorSet
// ---------------------------------------------------------------------------

/// Every indicator computed from one series snapshot.
///
/// All fields are `None` for an empty series and `Some` otherwise.
/// `volume_ratio` is the exception: it also stays `None` when the latest
/// sample carries no volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub price: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdResult>,
    pub bollinger: Option<BollingerResult>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub atr: Option<f64>,
    pub stochastic: Option<StochasticResult>,
    pub williams_r: Option<f64>,
    pub vwap: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub volume_ratio: Option<f64>,
    /// Indicators whose value is a fallback rather than a full computation.
    #[serde(default)]
    pub warmup: Vec<String>,
}

impl IndicatorSet {
    /// Compute the full set from an oldest-first snapshot.
    pub fn compute(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let closes: Vec<f64> = samples.iter().map(|s| s.price).collect();
        let n = closes.len();
        let levels = levels::calculate_levels(&closes, LEVELS_LOOKBACK);

        let mut warmup = Vec::new();
        let mut flag = |name: &str, short: bool| {
            if short {
                warmup.push(name.to_string());
            }
        };
        flag("rsi", rsi::is_warming_up(&closes, RSI_PERIOD));
        flag("macd", n < EMA_SLOW);
        flag("bollinger", n < BOLLINGER_PERIOD);
        flag("sma20", n < SMA_SHORT);
        flag("sma50", n < SMA_LONG);
        flag("ema12", n < EMA_FAST);
        flag("ema26", n < EMA_SLOW);
        flag(
            "atr",
            n < ATR_PERIOD + 1 || atr::uses_ohlc_fallback(samples, ATR_PERIOD),
        );
        flag("stochastic", n < STOCHASTIC_PERIOD);
        flag("williams_r", n < WILLIAMS_R_PERIOD);
        flag("vwap", volume::uses_default_volume(samples));
        flag("levels", n < LEVELS_LOOKBACK);

        Self {
            price: closes.last().copied(),
            rsi: rsi::calculate_rsi(&closes, RSI_PERIOD),
            macd: macd::calculate_macd(&closes),
            bollinger: bollinger::calculate_bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_STD),
            sma20: sma::calculate_sma(&closes, SMA_SHORT),
            sma50: sma::calculate_sma(&closes, SMA_LONG),
            ema12: ema::calculate_ema(&closes, EMA_FAST),
            ema26: ema::calculate_ema(&closes, EMA_SLOW),
            atr: atr::calculate_atr(samples, ATR_PERIOD),
            stochastic: stochastic::calculate_stochastic(samples, STOCHASTIC_PERIOD),
            williams_r: stochastic::calculate_williams_r(samples, WILLIAMS_R_PERIOD),
            vwap: volume::calculate_vwap(samples),
            support: levels.map(|l| l.support),
            resistance: levels.map(|l| l.resistance),
            volume_ratio: volume::calculate_volume_ratio(samples, VOLUME_RATIO_PERIOD),
            warmup,
        }
    }

    /// True when `name` is running on its fallback value.
    pub fn is_warming_up(&self, name: &str) -> bool {
        self.warmup.iter().any(|w| w == name)
    }
}
