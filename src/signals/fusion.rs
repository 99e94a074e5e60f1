// =============================================================================
// Hybrid Fusion Engine — weighted combination of independent opinions
// =============================================================================
//
// Steps:
//   1. Source share per opinion = configured source weight * opinion weight,
//      normalised over all opinions.  Effective weight = confidence * share,
//      normalised to sum to 1 (the shares themselves when every confidence
//      is zero).  Only relative weights matter.
//   2. Action: unanimous action if all agree, otherwise the action of the
//      opinion with the highest effective weight.  Ties prefer a model
//      source over the traditional one, then earlier input order.
//   3. Confidence: Σ effective_weight * opinion confidence.
//   4. Disagreement: more than one distinct action and alerts enabled; a
//      synthetic warning reason is placed first.
//   5. Reasons: every opinion's reasons in input order, optionally tagged
//      with their source, capped for display.  The full list is kept.
//   6. Below-threshold signals are returned, never suppressed; `weight` is
//      discounted and `below_threshold` set so the consumer can filter.
// =============================================================================

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::runtime_config::FusionConfig;
use crate::signals::opinion::{Opinion, OpinionSource};
use crate::types::{Action, SignalOrigin};

/// Two effective weights closer than this are considered tied.
const WEIGHT_TIE_EPSILON: f64 = 1e-12;

/// Prefix of the synthetic disagreement reason.
pub const DISAGREEMENT_FLAG: &str = "⚠️ Sources disagree";

/// The contribution of a single opinion to the hybrid signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpinionContribution {
    pub source: OpinionSource,
    pub action: Action,
    pub confidence: f64,
    /// Configured source weight times the opinion's own weight, as a share
    /// of the total over all opinions.
    pub source_weight: f64,
    /// Normalised share of the fused decision, all shares sum to 1.
    pub effective_weight: f64,
}

/// Fused output for one instrument.  Recomputed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSignal {
    pub symbol: String,
    pub action: Action,
    pub confidence: f64,
    /// Confidence, discounted when below the configured threshold.
    pub weight: f64,
    /// Display reasons, capped at `max_reasons`.
    pub reasons: Vec<String>,
    /// Every reason, uncapped.
    pub all_reasons: Vec<String>,
    pub source: SignalOrigin,
    pub disagreement: bool,
    pub below_threshold: bool,
    pub contributions: Vec<OpinionContribution>,
    pub timestamp: DateTime<Utc>,
}

impl HybridSignal {
    /// True when the signal is a trade (not HOLD) with enough confidence.
    pub fn is_actionable(&self, min_confidence: f64) -> bool {
        self.action != Action::Hold && self.confidence >= min_confidence
    }
}

/// Stateless fusion over a validated [`FusionConfig`].
#[derive(Debug, Clone)]
pub struct HybridFusionEngine {
    config: FusionConfig,
}

impl HybridFusionEngine {
    /// Build an engine; fails with [`EngineError::Config`] on invalid weights.
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse `opinions` for `symbol`, stamped with the current time.
    pub fn fuse(&self, symbol: &str, opinions: &[Opinion]) -> Result<HybridSignal> {
        self.fuse_at(symbol, opinions, Utc::now())
    }

    /// Fuse `opinions` for `symbol` with an explicit timestamp.
    pub fn fuse_at(
        &self,
        symbol: &str,
        opinions: &[Opinion],
        timestamp: DateTime<Utc>,
    ) -> Result<HybridSignal> {
        if opinions.is_empty() {
            return Err(EngineError::validation(format!(
                "{symbol}: at least one opinion is required"
            )));
        }
        for op in opinions {
            validate_opinion(op)?;
        }

        // ── 1. Effective weights ─────────────────────────────────────────
        let source_weights: Vec<f64> = opinions
            .iter()
            .map(|op| self.source_weight(&op.source) * op.weight)
            .collect();
        let weight_total: f64 = source_weights.iter().sum();
        if !(weight_total.is_finite() && weight_total > 0.0) {
            return Err(EngineError::config(format!(
                "{symbol}: every contributing source has zero weight"
            )));
        }
        let source_shares: Vec<f64> = source_weights.iter().map(|w| w / weight_total).collect();

        let raw: Vec<f64> = opinions
            .iter()
            .zip(&source_shares)
            .map(|(op, w)| op.confidence * w)
            .collect();
        let total: f64 = raw.iter().sum();
        // Zero confidence everywhere: fall back to the source shares so the
        // signal still resolves, with an aggregate confidence of zero.
        let effective: Vec<f64> = if total > 0.0 {
            raw.iter().map(|r| r / total).collect()
        } else {
            source_shares.clone()
        };

        // ── 2. Action resolution ─────────────────────────────────────────
        let mut distinct: Vec<Action> = Vec::new();
        for op in opinions {
            if !distinct.contains(&op.action) {
                distinct.push(op.action);
            }
        }
        let action = if distinct.len() == 1 {
            distinct[0]
        } else {
            opinions[dominant_index(opinions, &effective)].action
        };

        // ── 3. Aggregate confidence ──────────────────────────────────────
        let confidence = opinions
            .iter()
            .zip(&effective)
            .map(|(op, w)| op.confidence * w)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        // ── 4. Disagreement ──────────────────────────────────────────────
        let disagreement = distinct.len() > 1 && self.config.enable_disagreement_alert;

        // ── 5. Reasons ───────────────────────────────────────────────────
        let mut all_reasons = Vec::new();
        if disagreement {
            let views: Vec<String> = opinions
                .iter()
                .map(|op| format!("{}={}", op.source, op.action))
                .collect();
            all_reasons.push(format!("{DISAGREEMENT_FLAG}: {}", views.join(", ")));
        }
        for op in opinions {
            for reason in &op.reasons {
                if self.config.tag_reasons {
                    all_reasons.push(format!("[{}] {reason}", op.source));
                } else {
                    all_reasons.push(reason.clone());
                }
            }
        }
        let reasons: Vec<String> = all_reasons
            .iter()
            .take(self.config.max_reasons.max(1))
            .cloned()
            .collect();

        // ── 6. Threshold marking ─────────────────────────────────────────
        let threshold = self.config.confidence_threshold;
        let below_threshold = confidence < threshold;
        let weight = if below_threshold && threshold > 0.0 {
            confidence * confidence / threshold
        } else {
            confidence
        };

        let contributions = opinions
            .iter()
            .zip(source_shares.iter().zip(&effective))
            .map(|(op, (share, ew))| OpinionContribution {
                source: op.source.clone(),
                action: op.action,
                confidence: op.confidence,
                source_weight: *share,
                effective_weight: *ew,
            })
            .collect();

        let signal = HybridSignal {
            symbol: symbol.to_string(),
            action,
            confidence,
            weight,
            reasons,
            all_reasons,
            source: origin_of(opinions),
            disagreement,
            below_threshold,
            contributions,
            timestamp,
        };

        if disagreement {
            info!(
                symbol,
                action = %signal.action,
                sources = opinions.len(),
                "opinion sources disagree"
            );
        }
        debug!(
            symbol,
            action = %signal.action,
            confidence = signal.confidence,
            weight = signal.weight,
            origin = %signal.source,
            "hybrid signal fused"
        );

        Ok(signal)
    }

    fn source_weight(&self, source: &OpinionSource) -> f64 {
        match source {
            OpinionSource::Traditional => self.config.traditional_weight,
            OpinionSource::Model(_) => self.config.ai_weight,
        }
    }
}

fn validate_opinion(op: &Opinion) -> Result<()> {
    if !op.confidence.is_finite() || !(0.0..=1.0).contains(&op.confidence) {
        return Err(EngineError::validation(format!(
            "{}: confidence must be in [0, 1], got {}",
            op.source, op.confidence
        )));
    }
    if !op.weight.is_finite() || !(0.0..=1.0).contains(&op.weight) {
        return Err(EngineError::validation(format!(
            "{}: weight must be in [0, 1], got {}",
            op.source, op.weight
        )));
    }
    Ok(())
}

/// Index of the opinion with the highest effective weight.  Near-ties go to
/// a model source over the traditional one, then to the earliest opinion.
fn dominant_index(opinions: &[Opinion], effective: &[f64]) -> usize {
    let mut best = 0;
    for i in 1..opinions.len() {
        let diff = effective[i] - effective[best];
        let tied = diff.abs() <= WEIGHT_TIE_EPSILON;
        if (!tied && diff > 0.0)
            || (tied && opinions[i].source.is_model() && !opinions[best].source.is_model())
        {
            best = i;
        }
    }
    best
}

fn origin_of(opinions: &[Opinion]) -> SignalOrigin {
    let sources: HashSet<&OpinionSource> = opinions.iter().map(|op| &op.source).collect();
    if sources.len() >= 2 {
        return SignalOrigin::Combined;
    }
    match opinions[0].source {
        OpinionSource::Traditional => SignalOrigin::Human,
        OpinionSource::Model(_) => SignalOrigin::Ai,
    }
}
