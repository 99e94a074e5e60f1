// =============================================================================
// Engine errors
// =============================================================================
//
// Both kinds are local and recoverable: a caller typically keeps the last
// known signal or skips the symbol for this cycle.  Indicator shortfall is
// never an error; indicators degrade to their documented fallbacks instead.

use thiserror::Error;

/// Errors returned by the signal engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed input: a bad sample, an incomplete model opinion, or an
    /// empty opinion set.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unusable configuration, e.g. every fusion weight is zero.
    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
