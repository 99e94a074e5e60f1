// =============================================================================
// Hybrid Signals — command-line entry point
// =============================================================================
//
// Usage:
//   hybrid-signals <requests.json>     evaluate and print JSON results
//   hybrid-signals init-config         write the default config file
//
// The request file is a JSON array; each entry carries a symbol, its samples
// (oldest first) and optionally raw model outputs:
//
//   [{ "symbol": "AAPL",
//      "samples": [{ "timestamp": "...", "price": 101.2, "volume": 12000 }],
//      "models":  [{ "id": "lstm", "weight": 0.8, "action": "BUY",
//                    "confidence": 0.7, "reasoning": ["..."] }] }]
//
// The config path comes from HYBRID_SIGNALS_CONFIG (default
// `engine_config.json`); a missing or invalid file falls back to defaults.
// =============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hybrid_signals::{
    EngineConfig, EngineError, EvaluationRequest, ModelOutput, ModelSignalAdapter, Sample,
    SignalEngine,
};

const DEFAULT_CONFIG_PATH: &str = "engine_config.json";

/// One model's raw output plus its identity, as written in a request file.
#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(flatten)]
    output: ModelOutput,
}

#[derive(Debug, Deserialize)]
struct CliRequest {
    symbol: String,
    samples: Vec<Sample>,
    #[serde(default)]
    models: Vec<ModelEntry>,
}

impl CliRequest {
    /// Adapt the raw model outputs; a bad entry fails this symbol only.
    fn into_request(self) -> Result<EvaluationRequest, EngineError> {
        let model_opinions = self
            .models
            .into_iter()
            .map(|m| ModelSignalAdapter::adapt(&m.id, m.output, m.weight))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EvaluationRequest {
            symbol: self.symbol,
            samples: self.samples,
            model_opinions,
        })
    }
}

fn error_entry(symbol: &str, error: &EngineError) -> serde_json::Value {
    serde_json::json!({
        "symbol": symbol,
        "error": error.to_string(),
    })
}

/// Evaluate every request, keeping input order.  Requests whose model
/// outputs are malformed, and symbols whose evaluation fails, come back as
/// `{symbol, error}` entries without affecting the rest of the batch.
fn evaluate_batch(
    engine: &SignalEngine,
    parsed: Vec<CliRequest>,
) -> anyhow::Result<Vec<serde_json::Value>> {
    let mut out = vec![serde_json::Value::Null; parsed.len()];
    let mut slots = Vec::with_capacity(parsed.len());
    let mut requests = Vec::with_capacity(parsed.len());

    for (i, req) in parsed.into_iter().enumerate() {
        let symbol = req.symbol.clone();
        match req.into_request() {
            Ok(r) => {
                slots.push(i);
                requests.push(r);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "model output rejected, symbol skipped");
                out[i] = error_entry(&symbol, &e);
            }
        }
    }

    info!(count = requests.len(), "evaluating symbols");

    let results = engine.evaluate_many(&requests);
    for ((slot, req), result) in slots.into_iter().zip(&requests).zip(results) {
        out[slot] = match result {
            Ok(eval) => serde_json::to_value(eval)?,
            Err(e) => error_entry(&req.symbol, &e),
        };
    }
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("HYBRID_SIGNALS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let Some(arg) = std::env::args().nth(1) else {
        bail!("usage: hybrid-signals <requests.json> | init-config");
    };

    if arg == "init-config" {
        EngineConfig::default().save(&config_path)?;
        info!(path = %config_path, "default config written");
        return Ok(());
    }

    // ── 2. Config ────────────────────────────────────────────────────────
    let config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });
    let engine = SignalEngine::new(config)?;

    // ── 3. Requests ──────────────────────────────────────────────────────
    let raw = std::fs::read_to_string(&arg)
        .with_context(|| format!("failed to read requests from {arg}"))?;
    let parsed: Vec<CliRequest> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse requests in {arg}"))?;

    // ── 4. Evaluate & print ──────────────────────────────────────────────
    let out = evaluate_batch(&engine, parsed)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
