// =============================================================================
// Model Signal Adapter — repackages external model output as an Opinion
// =============================================================================
//
// The model itself is an external collaborator; nothing here performs
// inference.  The adapter validates the shape, tags the source as
// `model:<id>`, and passes reasons and feature scores through unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::signals::opinion::{Opinion, OpinionSource};
use crate::types::Action;

/// Already-scored output of an external model, as it arrives over the wire.
///
/// `action` and `confidence` are optional here so that incomplete payloads
/// deserialise and can be rejected with a precise validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOutput {
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

pub struct ModelSignalAdapter;

impl ModelSignalAdapter {
    /// Default per-model weight when the caller supplies none.
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    /// Convert `output` from model `model_id` into an opinion.
    ///
    /// Fails with [`EngineError::Validation`] when the id is blank, the
    /// action or confidence is missing, the confidence is outside `[0, 1]`,
    /// or the weight is outside `[0, 1]`.
    pub fn adapt(model_id: &str, output: ModelOutput, weight: Option<f64>) -> Result<Opinion> {
        let id = model_id.trim();
        if id.is_empty() {
            return Err(EngineError::validation("model id must not be empty"));
        }

        let Some(action) = output.action else {
            warn!(model = id, "model output rejected: missing action");
            return Err(EngineError::validation(format!(
                "model {id}: output is missing `action`"
            )));
        };

        let confidence = match output.confidence {
            Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => c,
            Some(c) => {
                warn!(model = id, confidence = c, "model output rejected: confidence out of range");
                return Err(EngineError::validation(format!(
                    "model {id}: confidence must be in [0, 1], got {c}"
                )));
            }
            None => {
                warn!(model = id, "model output rejected: missing confidence");
                return Err(EngineError::validation(format!(
                    "model {id}: output is missing `confidence`"
                )));
            }
        };

        let weight = weight.unwrap_or(Self::DEFAULT_WEIGHT);
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(EngineError::validation(format!(
                "model {id}: weight must be in [0, 1], got {weight}"
            )));
        }

        Ok(Opinion {
            source: OpinionSource::Model(id.to_string()),
            action,
            confidence,
            reasons: output.reasoning,
            weight,
            features: output.features,
        })
    }
}
