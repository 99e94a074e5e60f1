// =============================================================================
// Signals Module
// =============================================================================
//
// Opinion producers and the fusion step that combines them:
// - Traditional (rule-based) opinion from the indicator set
// - Model adapter for externally scored opinions
// - Hybrid fusion into a single ranked signal

pub mod fusion;
pub mod model;
pub mod opinion;
pub mod traditional;

pub use fusion::{HybridFusionEngine, HybridSignal, OpinionContribution};
pub use model::{ModelOutput, ModelSignalAdapter};
pub use opinion::{Opinion, OpinionSource};
pub use traditional::TraditionalSignalGenerator;
