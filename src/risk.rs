// =============================================================================
// Risk Scorer — 0-100 risk score and position-size suggestion
// =============================================================================
//
// Score components:
//   1. Base: `base_score` (50).
//   2. Volatility: points proportional to volatility as a % of price,
//      capped at `volatility_cap`.
//   3. Liquidity: minus `liquidity_adjustment` at or above the
//      high-liquidity volume, plus it below the low one.
//   4. RSI extremes: plus `rsi_extreme_adjustment` above `rsi_upper` or
//      below `rsi_lower`.
//
// The total is clamped to [0, 100] and rounded.  Labels come from the
// configured cut points, not hidden constants.  The score is non-decreasing
// in volatility with every other input held fixed.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::IndicatorSet;
use crate::runtime_config::RiskConfig;
use crate::types::RiskLevel;

/// Inputs to a single risk evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    pub price: f64,
    /// Absolute volatility estimate in price units (ATR or band half-width).
    pub volatility: Option<f64>,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
}

/// Result of a risk evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    /// Suggested position as a percentage of capital.
    pub suggested_position_pct: f64,
    /// Human-readable breakdown of the adjustments applied.
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Score `input`.  Deterministic and side-effect free.
    pub fn score(&self, input: &RiskInput) -> RiskAssessment {
        let c = &self.config;
        let mut factors = Vec::new();
        let mut score = c.base_score;

        // ── Volatility ───────────────────────────────────────────────────
        let vol_pct = match input.volatility {
            Some(v) if input.price > 0.0 && v.is_finite() => (v / input.price * 100.0).max(0.0),
            _ => 0.0,
        };
        let vol_points = (vol_pct * c.volatility_points_per_pct).clamp(0.0, c.volatility_cap);
        score += vol_points;
        if input.volatility.is_some() {
            factors.push(format!("Volatility {vol_pct:.2}% of price (+{vol_points:.1})"));
        }

        // ── Liquidity ────────────────────────────────────────────────────
        if let Some(volume) = input.volume {
            if volume >= c.high_liquidity_volume {
                score -= c.liquidity_adjustment;
                factors.push(format!("High liquidity {volume:.0} (-{:.1})", c.liquidity_adjustment));
            } else if volume < c.low_liquidity_volume {
                score += c.liquidity_adjustment;
                factors.push(format!("Low liquidity {volume:.0} (+{:.1})", c.liquidity_adjustment));
            }
        }

        // ── RSI extremes ─────────────────────────────────────────────────
        if let Some(rsi) = input.rsi {
            if rsi > c.rsi_upper || rsi < c.rsi_lower {
                score += c.rsi_extreme_adjustment;
                factors.push(format!("RSI {rsi:.1} extreme (+{:.1})", c.rsi_extreme_adjustment));
            }
        }

        let score = score.clamp(0.0, 100.0).round() as u8;
        let level = self.level_for(score);
        let suggested_position_pct = c.base_position_pct * (1.0 - f64::from(score) / 100.0);

        debug!(score, level = %level, vol_pct, "risk scored");

        RiskAssessment {
            score,
            level,
            suggested_position_pct,
            factors,
        }
    }

    /// Score straight from an indicator set plus the latest volume.
    pub fn assess(&self, indicators: &IndicatorSet, volume: Option<f64>) -> Option<RiskAssessment> {
        let price = indicators.price?;
        Some(self.score(&RiskInput {
            price,
            volatility: volatility_from(indicators),
            volume,
            rsi: indicators.rsi,
        }))
    }

    /// Categorical label for a score.
    pub fn level_for(&self, score: u8) -> RiskLevel {
        if score >= self.config.high_from {
            RiskLevel::High
        } else if score >= self.config.medium_from {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Volatility estimate: ATR when available, otherwise the Bollinger band
/// half-width.
pub fn volatility_from(indicators: &IndicatorSet) -> Option<f64> {
    indicators
        .atr
        .or_else(|| indicators.bollinger.map(|bb| bb.upper - bb.middle))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn input(volatility: f64, volume: Option<f64>, rsi: Option<f64>) -> RiskInput {
        RiskInput {
            price: 100.0,
            volatility: Some(volatility),
            volume,
            rsi,
        }
    }

    #[test]
    fn base_case_is_medium() {
        let a = RiskScorer::default().score(&input(0.0, Some(500_000.0), Some(50.0)));
        assert_eq!(a.score, 50);
        assert_eq!(a.level, RiskLevel::Medium);
        assert!((a.suggested_position_pct - 1.0).abs() < 1e-12);
    }

    #[test]
    fn volatility_adds_points_up_to_cap() {
        let scorer = RiskScorer::default();
        // 2 % of price => 20 points
        assert_eq!(scorer.score(&input(2.0, None, None)).score, 70);
        // 10 % of price => capped at 40 points
        let a = scorer.score(&input(10.0, None, None));
        assert_eq!(a.score, 90);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn liquidity_adjusts_both_ways() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.score(&input(0.0, Some(2_000_000.0), None)).score, 40);
        assert_eq!(scorer.score(&input(0.0, Some(10_000.0), None)).score, 60);
        assert_eq!(scorer.score(&input(0.0, None, None)).score, 50);
    }

    #[test]
    fn rsi_extremes_add_risk() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.score(&input(0.0, None, Some(75.0))).score, 60);
        assert_eq!(scorer.score(&input(0.0, None, Some(25.0))).score, 60);
        assert_eq!(scorer.score(&input(0.0, None, Some(70.0))).score, 50);
    }

    #[test]
    fn score_is_clamped() {
        let scorer = RiskScorer::new(RiskConfig {
            base_score: 95.0,
            ..RiskConfig::default()
        });
        let a = scorer.score(&input(10.0, Some(1.0), Some(90.0)));
        assert_eq!(a.score, 100);
        assert_eq!(a.suggested_position_pct, 0.0);

        let scorer = RiskScorer::new(RiskConfig {
            base_score: 0.0,
            ..RiskConfig::default()
        });
        let a = scorer.score(&input(0.0, Some(5_000_000.0), None));
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
    }

    #[test]
    fn cut_points_are_configurable() {
        let scorer = RiskScorer::new(RiskConfig {
            medium_from: 30,
            high_from: 50,
            ..RiskConfig::default()
        });
        assert_eq!(scorer.level_for(29), RiskLevel::Low);
        assert_eq!(scorer.level_for(30), RiskLevel::Medium);
        assert_eq!(scorer.level_for(50), RiskLevel::High);

        let default = RiskScorer::default();
        assert_eq!(default.level_for(39), RiskLevel::Low);
        assert_eq!(default.level_for(69), RiskLevel::Medium);
        assert_eq!(default.level_for(70), RiskLevel::High);
    }

    #[test]
    fn volatility_prefers_atr() {
        let mut set = IndicatorSet {
            price: Some(100.0),
            atr: Some(3.0),
            bollinger: Some(crate::indicators::BollingerResult {
                upper: 104.0,
                middle: 100.0,
                lower: 96.0,
                width: 8.0,
                position: 50.0,
            }),
            ..IndicatorSet::default()
        };
        assert_eq!(volatility_from(&set), Some(3.0));
        set.atr = None;
        assert_eq!(volatility_from(&set), Some(4.0));
        assert!(RiskScorer::default().assess(&set, None).is_some());
        assert!(RiskScorer::default()
            .assess(&IndicatorSet::default(), None)
            .is_none());
    }
}
