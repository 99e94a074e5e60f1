// =============================================================================
// Hybrid Signals — rule-based and model-driven trading signals, fused
// =============================================================================
//
// Library surface.  A caller feeds price samples into a `SeriesStore`, hands
// a snapshot plus any model opinions to `SignalEngine::evaluate`, and gets an
// `Evaluation` back: indicators, the traditional opinion, the fused
// `HybridSignal`, and a risk assessment.  Transport and persistence of
// results belong to the caller.
// =============================================================================

pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod risk;
pub mod runtime_config;
pub mod signals;
pub mod types;

pub use engine::{Evaluation, EvaluationRequest, SignalEngine};
pub use error::{EngineError, Result};
pub use indicators::IndicatorSet;
pub use market_data::{Sample, SeriesBuffer, SeriesStore};
pub use risk::{RiskAssessment, RiskInput, RiskScorer};
pub use runtime_config::{EngineConfig, FusionConfig, FusionConfigUpdate, RiskConfig, TraditionalThresholds};
pub use signals::{
    HybridFusionEngine, HybridSignal, ModelOutput, ModelSignalAdapter, Opinion, OpinionSource,
    TraditionalSignalGenerator,
};
pub use types::{Action, RiskLevel, SignalOrigin};
