// =============================================================================
// Runtime Configuration — tunable engine settings with atomic save
// =============================================================================
//
// Every tunable parameter of the signal engine lives here: fusion weights and
// threshold, the traditional generator's cut points, and the risk scorer's
// bands.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_source_weight() -> f64 {
    0.5
}

fn default_confidence_threshold() -> f64 {
    0.6
}

fn default_max_reasons() -> usize {
    5
}

fn default_series_capacity() -> usize {
    200
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_band_low_pct() -> f64 {
    20.0
}

fn default_band_high_pct() -> f64 {
    80.0
}

fn default_volume_high_ratio() -> f64 {
    1.5
}

fn default_volume_low_ratio() -> f64 {
    0.5
}

fn default_min_agreement() -> usize {
    2
}

fn default_extreme_damping() -> f64 {
    0.85
}

fn default_volume_bonus() -> f64 {
    0.05
}

fn default_low_volume_damping() -> f64 {
    0.9
}

fn default_base_score() -> f64 {
    50.0
}

fn default_volatility_points_per_pct() -> f64 {
    10.0
}

fn default_volatility_cap() -> f64 {
    40.0
}

fn default_high_liquidity_volume() -> f64 {
    1_000_000.0
}

fn default_low_liquidity_volume() -> f64 {
    100_000.0
}

fn default_liquidity_adjustment() -> f64 {
    10.0
}

fn default_rsi_extreme_adjustment() -> f64 {
    10.0
}

fn default_medium_from() -> u8 {
    40
}

fn default_high_from() -> u8 {
    70
}

fn default_base_position_pct() -> f64 {
    2.0
}

// =============================================================================
// FusionConfig
// =============================================================================

/// Weights and policy for the hybrid fusion engine.
///
/// The two source weights need not sum to 1 (fusion normalises) but must not
/// both be zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Weight of the rule-based (traditional) analyzer.
    #[serde(default = "default_source_weight")]
    pub traditional_weight: f64,

    /// Weight applied to every model-sourced opinion.
    #[serde(default = "default_source_weight")]
    pub ai_weight: f64,

    /// Confidence below which the hybrid signal is marked `below_threshold`.
    /// The engine never suppresses a signal; consumers filter.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Flag and explain divergent source actions.
    #[serde(default = "default_true")]
    pub enable_disagreement_alert: bool,

    /// Cap on the display reasons list; the full list is kept separately.
    #[serde(default = "default_max_reasons")]
    pub max_reasons: usize,

    /// Prefix each reason with its originating source, e.g. `[traditional]`.
    #[serde(default = "default_true")]
    pub tag_reasons: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            traditional_weight: default_source_weight(),
            ai_weight: default_source_weight(),
            confidence_threshold: default_confidence_threshold(),
            enable_disagreement_alert: true,
            max_reasons: default_max_reasons(),
            tag_reasons: true,
        }
    }
}

impl FusionConfig {
    /// Reject negative, non-finite or all-zero weights and an out-of-range
    /// threshold.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, w) in [
            ("traditional_weight", self.traditional_weight),
            ("ai_weight", self.ai_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(EngineError::config(format!(
                    "{name} must be a non-negative finite number, got {w}"
                )));
            }
        }
        if self.traditional_weight == 0.0 && self.ai_weight == 0.0 {
            return Err(EngineError::config(
                "traditional_weight and ai_weight must not both be zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::config(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    /// Merge a partial update and validate the result.  On failure `self` is
    /// left unchanged.
    pub fn apply_update(&mut self, update: &FusionConfigUpdate) -> Result<(), EngineError> {
        let mut next = self.clone();
        if let Some(w) = update.traditional_weight {
            next.traditional_weight = w;
        }
        if let Some(w) = update.ai_weight {
            next.ai_weight = w;
        }
        if let Some(t) = update.confidence_threshold {
            next.confidence_threshold = t;
        }
        if let Some(b) = update.enable_disagreement_alert {
            next.enable_disagreement_alert = b;
        }
        if let Some(n) = update.max_reasons {
            next.max_reasons = n;
        }
        if let Some(b) = update.tag_reasons {
            next.tag_reasons = b;
        }
        next.validate()?;

        info!(
            traditional_weight = next.traditional_weight,
            ai_weight = next.ai_weight,
            confidence_threshold = next.confidence_threshold,
            "fusion config updated"
        );
        *self = next;
        Ok(())
    }
}

/// Partial fusion settings, e.g. the JSON body of a settings update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionConfigUpdate {
    #[serde(default)]
    pub traditional_weight: Option<f64>,
    #[serde(default)]
    pub ai_weight: Option<f64>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub enable_disagreement_alert: Option<bool>,
    #[serde(default)]
    pub max_reasons: Option<usize>,
    #[serde(default)]
    pub tag_reasons: Option<bool>,
}

// =============================================================================
// TraditionalThresholds
// =============================================================================

/// Cut points for the rule-based signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraditionalThresholds {
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,

    /// Band position (%) below which price is stretched toward the lower band.
    #[serde(default = "default_band_low_pct")]
    pub band_low_pct: f64,

    /// Band position (%) above which price is stretched toward the upper band.
    #[serde(default = "default_band_high_pct")]
    pub band_high_pct: f64,

    /// Latest / average volume at or above which a move counts as confirmed.
    #[serde(default = "default_volume_high_ratio")]
    pub volume_high_ratio: f64,

    /// Latest / average volume at or below which a move counts as thin.
    #[serde(default = "default_volume_low_ratio")]
    pub volume_low_ratio: f64,

    /// Minimum directional votes required for BUY or SELL.
    #[serde(default = "default_min_agreement")]
    pub min_agreement: usize,

    /// Confidence multiplier for a BUY into overbought RSI (or SELL into
    /// oversold).
    #[serde(default = "default_extreme_damping")]
    pub extreme_damping: f64,

    /// Confidence added when volume confirms.
    #[serde(default = "default_volume_bonus")]
    pub volume_bonus: f64,

    /// Confidence multiplier when volume is thin.
    #[serde(default = "default_low_volume_damping")]
    pub low_volume_damping: f64,
}

impl Default for TraditionalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            band_low_pct: default_band_low_pct(),
            band_high_pct: default_band_high_pct(),
            volume_high_ratio: default_volume_high_ratio(),
            volume_low_ratio: default_volume_low_ratio(),
            min_agreement: default_min_agreement(),
            extreme_damping: default_extreme_damping(),
            volume_bonus: default_volume_bonus(),
            low_volume_damping: default_low_volume_damping(),
        }
    }
}

// =============================================================================
// RiskConfig
// =============================================================================

/// Bands and adjustments for the risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_base_score")]
    pub base_score: f64,

    /// Points added per 1 % of volatility relative to price.
    #[serde(default = "default_volatility_points_per_pct")]
    pub volatility_points_per_pct: f64,

    /// Maximum points the volatility term may add.
    #[serde(default = "default_volatility_cap")]
    pub volatility_cap: f64,

    /// Volume at or above which the instrument counts as liquid.
    #[serde(default = "default_high_liquidity_volume")]
    pub high_liquidity_volume: f64,

    /// Volume below which the instrument counts as illiquid.
    #[serde(default = "default_low_liquidity_volume")]
    pub low_liquidity_volume: f64,

    #[serde(default = "default_liquidity_adjustment")]
    pub liquidity_adjustment: f64,

    #[serde(default = "default_rsi_overbought")]
    pub rsi_upper: f64,

    #[serde(default = "default_rsi_oversold")]
    pub rsi_lower: f64,

    #[serde(default = "default_rsi_extreme_adjustment")]
    pub rsi_extreme_adjustment: f64,

    /// Lowest score labelled MEDIUM.
    #[serde(default = "default_medium_from")]
    pub medium_from: u8,

    /// Lowest score labelled HIGH.
    #[serde(default = "default_high_from")]
    pub high_from: u8,

    /// Position size (% of capital) suggested at zero risk.
    #[serde(default = "default_base_position_pct")]
    pub base_position_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_score: default_base_score(),
            volatility_points_per_pct: default_volatility_points_per_pct(),
            volatility_cap: default_volatility_cap(),
            high_liquidity_volume: default_high_liquidity_volume(),
            low_liquidity_volume: default_low_liquidity_volume(),
            liquidity_adjustment: default_liquidity_adjustment(),
            rsi_upper: default_rsi_overbought(),
            rsi_lower: default_rsi_oversold(),
            rsi_extreme_adjustment: default_rsi_extreme_adjustment(),
            medium_from: default_medium_from(),
            high_from: default_high_from(),
            base_position_pct: default_base_position_pct(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the signal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub traditional: TraditionalThresholds,

    #[serde(default)]
    pub risk: RiskConfig,

    /// Samples retained per symbol; must cover the longest look-back in use.
    #[serde(default = "default_series_capacity")]
    pub series_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            traditional: TraditionalThresholds::default(),
            risk: RiskConfig::default(),
            series_capacity: default_series_capacity(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        config
            .fusion
            .validate()
            .with_context(|| format!("invalid fusion settings in {}", path.display()))?;

        info!(
            path = %path.display(),
            traditional_weight = config.fusion.traditional_weight,
            ai_weight = config.fusion.ai_weight,
            series_capacity = config.series_capacity,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}
