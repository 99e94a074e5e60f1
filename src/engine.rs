// =============================================================================
// Signal Engine — end-to-end evaluation for one or many symbols
// =============================================================================
//
// Invoked by an external scheduler each time a new sample lands; the engine
// holds no timers and buffers no requests.
//
// Pipeline:
//   1. Validate the series snapshot (non-empty, valid samples, strictly
//      increasing timestamps)
//   2. Compute the indicator set
//   3. Build the traditional opinion
//   4. Fuse it with any externally supplied model opinions
//   5. Score risk from indicators + latest volume
//   6. Output an Evaluation record
//
// Independent symbols share nothing mutable, so `evaluate_many` fans out
// across a rayon pool without coordination.
// =============================================================================

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::indicators::IndicatorSet;
use crate::market_data::{validate_series, Sample, SeriesStore};
use crate::risk::{RiskAssessment, RiskScorer};
use crate::runtime_config::{EngineConfig, FusionConfigUpdate};
use crate::signals::{HybridFusionEngine, HybridSignal, Opinion, TraditionalSignalGenerator};

// =============================================================================
// Evaluation record
// =============================================================================

/// Everything computed for one symbol in one evaluation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique identifier for this evaluation (UUID v4).
    pub id: Uuid,
    pub symbol: String,
    pub price: f64,
    pub indicators: IndicatorSet,
    pub traditional: Opinion,
    pub signal: HybridSignal,
    pub risk: RiskAssessment,
    pub created_at: DateTime<Utc>,
}

/// Input for one symbol, e.g. one entry of a batch request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub symbol: String,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub model_opinions: Vec<Opinion>,
}

// =============================================================================
// Signal Engine
// =============================================================================

pub struct SignalEngine {
    config: RwLock<EngineConfig>,
}

impl SignalEngine {
    /// Build an engine; rejects an invalid fusion configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.fusion.validate()?;
        if config.series_capacity == 0 {
            return Err(EngineError::config("series_capacity must be at least 1"));
        }
        Ok(Self {
            config: RwLock::new(config),
        })
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Apply a partial fusion update; the old settings stay on error.
    pub fn update_fusion(&self, update: &FusionConfigUpdate) -> Result<()> {
        self.config.write().fusion.apply_update(update)
    }

    /// Empty series store sized from the configured capacity.
    pub fn new_store(&self) -> Result<SeriesStore> {
        SeriesStore::new(self.config.read().series_capacity)
    }

    /// Evaluate `symbol` over an oldest-first snapshot, fused with
    /// `model_opinions`.
    pub fn evaluate(
        &self,
        symbol: &str,
        samples: &[Sample],
        model_opinions: &[Opinion],
    ) -> Result<Evaluation> {
        self.evaluate_at(symbol, samples, model_opinions, Utc::now())
    }

    /// As [`evaluate`](Self::evaluate) with an explicit timestamp.
    pub fn evaluate_at(
        &self,
        symbol: &str,
        samples: &[Sample],
        model_opinions: &[Opinion],
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        let config = self.config.read().clone();

        // ── 1. Snapshot checks ───────────────────────────────────────────
        let Some(latest) = samples.last() else {
            return Err(EngineError::validation(format!(
                "{symbol}: cannot evaluate an empty series"
            )));
        };
        validate_series(samples).map_err(|e| match e {
            EngineError::Validation(msg) => EngineError::validation(format!("{symbol}: {msg}")),
            other => other,
        })?;
        if let Some(op) = model_opinions.iter().find(|op| !op.source.is_model()) {
            return Err(EngineError::validation(format!(
                "{symbol}: model opinions must come from a model source, got {}",
                op.source
            )));
        }
        let price = latest.price;

        // ── 2. Indicators ────────────────────────────────────────────────
        let indicators = IndicatorSet::compute(samples);

        // ── 3. Traditional opinion ───────────────────────────────────────
        let traditional =
            TraditionalSignalGenerator::new(config.traditional.clone()).generate(&indicators, price);

        // ── 4. Fusion ────────────────────────────────────────────────────
        let mut opinions = Vec::with_capacity(model_opinions.len() + 1);
        opinions.push(traditional.clone());
        opinions.extend_from_slice(model_opinions);
        let signal = HybridFusionEngine::new(config.fusion.clone())?.fuse_at(symbol, &opinions, now)?;

        // ── 5. Risk ──────────────────────────────────────────────────────
        let risk = RiskScorer::new(config.risk.clone())
            .assess(&indicators, latest.volume)
            .ok_or_else(|| EngineError::validation(format!("{symbol}: no price to score")))?;

        debug!(
            symbol,
            samples = samples.len(),
            warmup = ?indicators.warmup,
            "indicators computed"
        );
        info!(
            symbol,
            action = %signal.action,
            confidence = signal.confidence,
            origin = %signal.source,
            disagreement = signal.disagreement,
            risk_score = risk.score,
            risk_level = %risk.level,
            "signal evaluated"
        );

        Ok(Evaluation {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            price,
            indicators,
            traditional,
            signal,
            risk,
            created_at: now,
        })
    }

    /// Evaluate the current snapshot of `symbol` held in `store`.
    pub fn evaluate_store(
        &self,
        store: &SeriesStore,
        symbol: &str,
        model_opinions: &[Opinion],
    ) -> Result<Evaluation> {
        self.evaluate(symbol, &store.snapshot(symbol), model_opinions)
    }

    /// Evaluate independent symbols in parallel.  Results keep request
    /// order; one symbol failing does not affect the others.
    pub fn evaluate_many(&self, requests: &[EvaluationRequest]) -> Vec<Result<Evaluation>> {
        requests
            .par_iter()
            .map(|req| {
                self.evaluate(&req.symbol, &req.samples, &req.model_opinions)
                    .map_err(|e| {
                        warn!(symbol = %req.symbol, error = %e, "evaluation skipped");
                        e
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for SignalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cfg = self.config.read();
        f.debug_struct("SignalEngine")
            .field("traditional_weight", &cfg.fusion.traditional_weight)
            .field("ai_weight", &cfg.fusion.ai_weight)
            .field("series_capacity", &cfg.series_capacity)
            .finish()
    }
}
