// =============================================================================
// Opinion — one source's directional view on a symbol
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Where an opinion came from.  Serialised as `"traditional"` or
/// `"model:<id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum OpinionSource {
    Traditional,
    Model(String),
}

impl OpinionSource {
    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

impl std::fmt::Display for OpinionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Traditional => write!(f, "traditional"),
            Self::Model(id) => write!(f, "model:{id}"),
        }
    }
}

impl From<OpinionSource> for String {
    fn from(src: OpinionSource) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for OpinionSource {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "traditional" {
            return Ok(Self::Traditional);
        }
        match s.strip_prefix("model:") {
            Some(id) if !id.is_empty() => Ok(Self::Model(id.to_string())),
            _ => Err(format!("unknown opinion source: {s}")),
        }
    }
}

/// A directional recommendation with confidence and reasons.
///
/// Built fresh on every evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub source: OpinionSource,
    pub action: Action,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub reasons: Vec<String>,
    /// Per-source multiplier in `[0, 1]`, applied on top of the configured
    /// source weight during fusion.
    pub weight: f64,
    /// Named feature scores reported by a model source.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_string_form() {
        assert_eq!(OpinionSource::Traditional.to_string(), "traditional");
        assert_eq!(OpinionSource::Model("lstm".into()).to_string(), "model:lstm");
        assert_eq!(
            OpinionSource::try_from("model:xgb".to_string()),
            Ok(OpinionSource::Model("xgb".into()))
        );
        assert!(OpinionSource::try_from("model:".to_string()).is_err());
        assert!(OpinionSource::try_from("oracle".to_string()).is_err());
    }

    #[test]
    fn opinion_json_uses_string_source() {
        let op = Opinion {
            source: OpinionSource::Model("lstm".into()),
            action: Action::Buy,
            confidence: 0.7,
            reasons: vec!["momentum".into()],
            weight: 1.0,
            features: BTreeMap::new(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["source"], "model:lstm");
        assert_eq!(json["action"], "BUY");
        assert!(json.get("features").is_none());
        let back: Opinion = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }
}
