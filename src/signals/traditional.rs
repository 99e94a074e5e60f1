// =============================================================================
// Traditional Signal Generator — rule-based opinion from the indicator set
// =============================================================================
//
// Pipeline:
//   1. RSI: momentum vote (above / below 50), zone noted
//   2. MACD: histogram sign vote
//   3. Volume: no vote; confirms or thins the winning side's confidence
//   4. SMA20: price above / below trend vote
//   5. Bollinger: position in band above / below 50 % vote, stretch noted
//
// Action:      BUY when bullish votes beat bearish votes and reach
//              `min_agreement`; SELL symmetric; HOLD otherwise.
// Confidence:  agreeing votes / voting indicators, then damped when the
//              trade leans into an RSI extreme and nudged by volume.  HOLD
//              scores (1 - strongest side / voting) * directional share.
//
// Indicators still on their warm-up fallback report a reason but do not
// vote.  With no votes at all the opinion is HOLD at zero confidence.
//
// One reason per indicator that has data, always in the order above.
// =============================================================================

use std::collections::BTreeMap;

use tracing::debug;

use crate::indicators::rsi::RsiZone;
use crate::indicators::IndicatorSet;
use crate::runtime_config::TraditionalThresholds;
use crate::signals::opinion::{Opinion, OpinionSource};
use crate::types::Action;

/// Reason suffix for an indicator running on its fallback value.
const WARMING_UP: &str = "(warming up, no vote)";

/// Direction of one indicator's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Bullish,
    Bearish,
    Abstain,
}

impl Vote {
    fn from_sign(x: f64) -> Self {
        if x > 0.0 {
            Self::Bullish
        } else if x < 0.0 {
            Self::Bearish
        } else {
            Self::Abstain
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Abstain => "neutral",
        }
    }
}

/// Maps an [`IndicatorSet`] to a `source = "traditional"` opinion.
#[derive(Debug, Clone, Default)]
pub struct TraditionalSignalGenerator {
    thresholds: TraditionalThresholds,
}

impl TraditionalSignalGenerator {
    pub fn new(thresholds: TraditionalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TraditionalThresholds {
        &self.thresholds
    }

    /// Build the traditional opinion for `price` given its indicators.
    pub fn generate(&self, indicators: &IndicatorSet, price: f64) -> Opinion {
        let t = &self.thresholds;
        let mut votes: Vec<Vote> = Vec::with_capacity(4);
        let mut reasons: Vec<String> = Vec::with_capacity(5);
        let mut rsi_zone = None;

        // ── 1. RSI ───────────────────────────────────────────────────────
        if let Some(rsi) = indicators.rsi {
            if indicators.is_warming_up("rsi") {
                reasons.push(format!("RSI {rsi:.1} {WARMING_UP}"));
            } else {
                let zone = RsiZone::classify(rsi, t.rsi_oversold, t.rsi_overbought);
                let vote = Vote::from_sign(rsi - 50.0);
                votes.push(vote);
                rsi_zone = Some(zone);
                reasons.push(format!("RSI {rsi:.1} {zone} ({} momentum)", vote.label()));
            }
        }

        // ── 2. MACD ──────────────────────────────────────────────────────
        if let Some(macd) = indicators.macd.filter(|_| indicators.is_warming_up("macd")) {
            reasons.push(format!("MACD histogram {:+.4} {WARMING_UP}", macd.histogram));
        } else if let Some(macd) = indicators.macd {
            let vote = Vote::from_sign(macd.histogram);
            votes.push(vote);
            reasons.push(format!(
                "MACD histogram {:+.4} ({} momentum)",
                macd.histogram,
                vote.label()
            ));
        }

        // ── 3. Volume ────────────────────────────────────────────────────
        let volume_ratio = indicators.volume_ratio;
        if let Some(ratio) = volume_ratio {
            let note = if ratio >= t.volume_high_ratio {
                "confirms move"
            } else if ratio <= t.volume_low_ratio {
                "thin participation"
            } else {
                "normal participation"
            };
            reasons.push(format!("Volume {ratio:.2}x average ({note})"));
        }

        // ── 4. SMA20 ─────────────────────────────────────────────────────
        if let Some(sma) = indicators.sma20.filter(|_| indicators.is_warming_up("sma20")) {
            reasons.push(format!("Price {price:.2} vs SMA20 {sma:.2} {WARMING_UP}"));
        } else if let Some(sma) = indicators.sma20 {
            let vote = Vote::from_sign(price - sma);
            votes.push(vote);
            let relation = match vote {
                Vote::Bullish => "above",
                Vote::Bearish => "below",
                Vote::Abstain => "at",
            };
            let trend = match vote {
                Vote::Bullish => "uptrend",
                Vote::Bearish => "downtrend",
                Vote::Abstain => "no trend",
            };
            reasons.push(format!("Price {price:.2} {relation} SMA20 {sma:.2} ({trend})"));
        }

        // ── 5. Bollinger position ────────────────────────────────────────
        if let Some(bb) = indicators.bollinger.filter(|_| indicators.is_warming_up("bollinger")) {
            reasons.push(format!("Bollinger position {:.0}% {WARMING_UP}", bb.position));
        } else if let Some(bb) = indicators.bollinger {
            let vote = Vote::from_sign(bb.position - 50.0);
            votes.push(vote);
            let stretch = if bb.position >= t.band_high_pct {
                ", stretched toward upper band"
            } else if bb.position <= t.band_low_pct {
                ", stretched toward lower band"
            } else {
                ""
            };
            reasons.push(format!(
                "Bollinger position {:.0}% ({}{stretch})",
                bb.position,
                vote.label()
            ));
        }

        // ── 6. Combine ───────────────────────────────────────────────────
        let available = votes.len();
        let bull = votes.iter().filter(|v| **v == Vote::Bullish).count();
        let bear = votes.iter().filter(|v| **v == Vote::Bearish).count();

        if available == 0 {
            if reasons.is_empty() {
                reasons.push("No indicator data available".to_string());
            } else {
                reasons.push("Not enough history for a directional view".to_string());
            }
            return self.opinion(Action::Hold, 0.0, reasons);
        }

        let action = if bull > bear && bull >= t.min_agreement {
            Action::Buy
        } else if bear > bull && bear >= t.min_agreement {
            Action::Sell
        } else {
            Action::Hold
        };

        let available_f = available as f64;
        let confidence = match action {
            // Strength of the standoff, scaled by how many indicators took a
            // side at all.  All-abstain is no evidence for HOLD either.
            Action::Hold => {
                let directional = (bull + bear) as f64 / available_f;
                (1.0 - bull.max(bear) as f64 / available_f) * directional
            }
            Action::Buy | Action::Sell => {
                let agreeing = if action == Action::Buy { bull } else { bear };
                let mut c = agreeing as f64 / available_f;
                let leaning_into_extreme = matches!(
                    (action, rsi_zone),
                    (Action::Buy, Some(RsiZone::Overbought)) | (Action::Sell, Some(RsiZone::Oversold))
                );
                if leaning_into_extreme {
                    c *= t.extreme_damping;
                }
                if let Some(ratio) = volume_ratio {
                    if ratio >= t.volume_high_ratio {
                        c += t.volume_bonus;
                    } else if ratio <= t.volume_low_ratio {
                        c *= t.low_volume_damping;
                    }
                }
                c
            }
        };

        debug!(
            bull,
            bear,
            available,
            action = %action,
            confidence,
            "traditional opinion computed"
        );

        self.opinion(action, confidence.clamp(0.0, 1.0), reasons)
    }

    fn opinion(&self, action: Action, confidence: f64, reasons: Vec<String>) -> Opinion {
        Opinion {
            source: OpinionSource::Traditional,
            action,
            confidence,
            reasons,
            weight: 1.0,
            features: BTreeMap::new(),
        }
    }
}
