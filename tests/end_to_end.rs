//! End-to-end scenarios: series in, fused signal out.

use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use hybrid_signals::signals::fusion::DISAGREEMENT_FLAG;
use hybrid_signals::{
    Action, EngineConfig, EngineError, FusionConfig, HybridFusionEngine, HybridSignal, ModelOutput,
    ModelSignalAdapter, Opinion, OpinionSource, Sample, SignalEngine, SignalOrigin,
};

fn uptrend() -> Vec<Sample> {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    (0..30)
        .map(|i| {
            let price = 100.0 + 30.0 * i as f64 / 29.0;
            Sample::new(t0 + Duration::minutes(i), price)
        })
        .collect()
}

fn opinion(source: OpinionSource, action: Action, confidence: f64, reasons: &[&str]) -> Opinion {
    Opinion {
        source,
        action,
        confidence,
        reasons: reasons.iter().map(|r| r.to_string()).collect(),
        weight: 1.0,
        features: BTreeMap::new(),
    }
}

#[test]
fn steady_uptrend_is_a_confident_buy() {
    let samples = uptrend();
    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    let eval = engine.evaluate("AAPL", &samples, &[]).unwrap();

    let closes: Vec<f64> = samples.iter().map(|s| s.price).collect();
    let expected_sma20 = closes[10..].iter().sum::<f64>() / 20.0;
    assert!((eval.indicators.sma20.unwrap() - expected_sma20).abs() < 1e-9);
    assert!(eval.indicators.rsi.unwrap() > 50.0);
    assert!(eval.indicators.is_warming_up("sma50"));
    assert!(!eval.indicators.is_warming_up("sma20"));

    assert_eq!(eval.signal.action, Action::Buy);
    assert!(eval.signal.confidence > 0.5);
    assert_eq!(eval.signal.source, SignalOrigin::Human);
    assert!(!eval.signal.disagreement);
    assert!(eval.signal.reasons.iter().all(|r| r.starts_with("[traditional] ")));
}

#[test]
fn disagreement_goes_to_the_heavier_view() {
    let engine = HybridFusionEngine::new(FusionConfig::default()).unwrap();
    let opinions = vec![
        opinion(OpinionSource::Traditional, Action::Sell, 0.8, &["RSI overbought"]),
        opinion(OpinionSource::Model("lstm".into()), Action::Buy, 0.6, &["pattern"]),
    ];
    let signal = engine.fuse("AAPL", &opinions).unwrap();

    assert_eq!(signal.action, Action::Sell);
    assert!(signal.disagreement);
    assert_eq!(signal.source, SignalOrigin::Combined);
    assert!(signal.reasons[0].starts_with(DISAGREEMENT_FLAG));
    assert_eq!(
        signal.reasons[0],
        format!("{DISAGREEMENT_FLAG}: traditional=SELL, model:lstm=BUY")
    );
    // 0.8 * 0.4/0.7 + 0.6 * 0.3/0.7
    assert!((signal.confidence - 0.5 / 0.7).abs() < 1e-9);
}

#[test]
fn unanimous_sources_do_not_disagree() {
    let engine = HybridFusionEngine::new(FusionConfig::default()).unwrap();
    let opinions = vec![
        opinion(OpinionSource::Traditional, Action::Buy, 0.7, &["a"]),
        opinion(OpinionSource::Model("xgb".into()), Action::Buy, 0.9, &["b"]),
    ];
    let signal = engine.fuse("MSFT", &opinions).unwrap();
    assert_eq!(signal.action, Action::Buy);
    assert!(!signal.disagreement);
    assert!(!signal.reasons.iter().any(|r| r.starts_with(DISAGREEMENT_FLAG)));
    assert_eq!(signal.source, SignalOrigin::Combined);
}

#[test]
fn signal_json_preserves_reason_order() {
    let engine = HybridFusionEngine::new(FusionConfig::default()).unwrap();
    let opinions = vec![
        opinion(OpinionSource::Traditional, Action::Hold, 0.5, &["first", "second"]),
        opinion(OpinionSource::Model("lstm".into()), Action::Hold, 0.5, &["third"]),
    ];
    let signal = engine.fuse("AAPL", &opinions).unwrap();

    let json = serde_json::to_string(&signal).unwrap();
    let back: HybridSignal = serde_json::from_str(&json).unwrap();
    assert_eq!(back.reasons, signal.reasons);
    assert_eq!(
        back.reasons,
        vec!["[traditional] first", "[traditional] second", "[model:lstm] third"]
    );
    assert_eq!(back, signal);
}

#[test]
fn model_output_flows_through_the_engine() {
    let output: ModelOutput = serde_json::from_str(
        r#"{ "action": "SELL", "confidence": 0.95, "reasoning": ["earnings miss"],
             "features": { "sentiment": -0.8 } }"#,
    )
    .unwrap();
    let model = ModelSignalAdapter::adapt("news", output, Some(1.0)).unwrap();

    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    let eval = engine.evaluate("AAPL", &uptrend(), &[model]).unwrap();

    // traditional BUY 0.85 * 0.5 = 0.425 vs model SELL 0.95 * 0.5 = 0.475
    assert_eq!(eval.signal.action, Action::Sell);
    assert!(eval.signal.disagreement);
    assert!(eval
        .signal
        .all_reasons
        .iter()
        .any(|r| r == "[model:news] earnings miss"));
}

#[test]
fn saved_config_drives_a_new_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine_config.json");

    let mut cfg = EngineConfig::default();
    cfg.fusion.tag_reasons = false;
    cfg.fusion.max_reasons = 2;
    cfg.save(&path).unwrap();

    let engine = SignalEngine::new(EngineConfig::load(&path).unwrap()).unwrap();
    let eval = engine.evaluate("AAPL", &uptrend(), &[]).unwrap();
    assert_eq!(eval.signal.reasons.len(), 2);
    assert!(eval.signal.reasons[0].starts_with("RSI"));
    assert!(eval.signal.all_reasons.len() > 2);
}

#[test]
fn short_history_does_not_outvote_a_model() {
    let samples = uptrend()[..3].to_vec();
    let output: ModelOutput =
        serde_json::from_str(r#"{ "action": "SELL", "confidence": 0.7 }"#).unwrap();
    let model = ModelSignalAdapter::adapt("lstm", output, None).unwrap();

    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    let eval = engine.evaluate("AAPL", &samples, &[model]).unwrap();

    assert!(eval.indicators.is_warming_up("rsi"));
    assert_eq!(eval.traditional.confidence, 0.0);
    assert_eq!(eval.signal.action, Action::Sell);
    assert!((eval.signal.confidence - 0.7).abs() < 1e-12);
}

#[test]
fn malformed_snapshot_is_rejected_before_evaluation() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let samples = vec![
        Sample::new(t0 + Duration::minutes(5), 100.0),
        Sample::new(t0, 20.0),
        Sample::new(t0 - Duration::minutes(5), f64::NAN),
    ];
    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    assert!(matches!(
        engine.evaluate("AAPL", &samples, &[]),
        Err(EngineError::Validation(_))
    ));
}

#[test]
fn scaled_config_weights_give_the_same_signal() {
    let opinions = vec![
        opinion(OpinionSource::Traditional, Action::Sell, 0.8, &["a"]),
        opinion(OpinionSource::Model("lstm".into()), Action::Buy, 0.6, &["b"]),
    ];
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let fuse = |w: f64| {
        HybridFusionEngine::new(FusionConfig {
            traditional_weight: w,
            ai_weight: w,
            ..FusionConfig::default()
        })
        .unwrap()
        .fuse_at("AAPL", &opinions, ts)
        .unwrap()
    };
    assert_eq!(fuse(0.5), fuse(1.0));
    assert_eq!(fuse(0.5), fuse(4.0));
}
