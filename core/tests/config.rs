//! PeerConfig loading and validation.

use peergroup_core::{
    config::{PeerConfig, DEFAULT_METRIC_COLUMN},
    engine::PeerEngine,
    error::PeerError,
    peer::WinsorPercentiles,
    threshold::{ThresholdTable, ALL_INSTITUTIONS},
};

#[test]
fn empty_object_yields_defaults() {
    let config = PeerConfig::from_json("{}").unwrap();
    assert_eq!(config, PeerConfig::default_test());
    assert_eq!(config.thresholds, ThresholdTable::standard());
    assert_eq!(config.metric_column, DEFAULT_METRIC_COLUMN);
    assert_eq!(config.winsorize, WinsorPercentiles { lower_pct: 1.0, upper_pct: 99.0 });
}

#[test]
fn partial_overrides_keep_other_defaults() {
    let config = PeerConfig::from_json(
        r#"{
            "winsorize": { "lower_pct": 5.0, "upper_pct": 95.0 },
            "metric_column": "grad_rate_150"
        }"#,
    )
    .unwrap();

    assert_eq!(config.winsorize.lower_pct, 5.0);
    assert_eq!(config.winsorize.upper_pct, 95.0);
    assert_eq!(config.metric_column, "grad_rate_150");
    assert!(config.thresholds.resolve(ALL_INSTITUTIONS).is_ok());
}

#[test]
fn custom_tiers_replace_the_standard_table() {
    let config = PeerConfig::from_json(
        r#"{ "thresholds": [
            { "label": "Any", "min_headcount": 0 },
            { "label": "Mid", "min_headcount": 2500 }
        ] }"#,
    )
    .unwrap();

    let labels: Vec<&str> = config.thresholds.labels().collect();
    assert_eq!(labels, vec!["Any", "Mid"]);
    assert!(config.thresholds.resolve(ALL_INSTITUTIONS).is_err());
}

#[test]
fn invalid_configs_are_rejected() {
    let cases = [
        r#"{ "winsorize": { "lower_pct": 60.0, "upper_pct": 40.0 } }"#,
        r#"{ "winsorize": { "lower_pct": -1.0, "upper_pct": 99.0 } }"#,
        r#"{ "metric_column": "  " }"#,
        r#"{ "thresholds": [] }"#,
        r#"{ "thresholds": [ { "label": "A", "min_headcount": 0 }, { "label": "A", "min_headcount": 10 } ] }"#,
    ];
    for case in cases {
        let err = PeerConfig::from_json(case).unwrap_err();
        assert!(matches!(err, PeerError::Config(_)), "Expected Config error for {case}; got {err:?}");
    }

    let err = PeerConfig::from_json("not json").unwrap_err();
    assert!(matches!(err, PeerError::Serialization(_)), "got {err:?}");
}

#[test]
fn engine_refuses_invalid_config() {
    let config = PeerConfig {
        winsorize: WinsorPercentiles { lower_pct: 10.0, upper_pct: 101.0 },
        ..PeerConfig::default_test()
    };
    assert!(PeerEngine::new(config).is_err());
}

#[test]
fn engine_winsorize_uses_configured_percentiles() {
    let config = PeerConfig {
        winsorize: WinsorPercentiles { lower_pct: 0.0, upper_pct: 50.0 },
        ..PeerConfig::default_test()
    };
    let engine = PeerEngine::new(config).unwrap();

    let out = engine.winsorize(&[Some(10.0), None, Some(20.0), Some(30.0)]);
    assert_eq!(out.values, vec![Some(10.0), None, Some(20.0), Some(20.0)]);
    let bounds = out.bounds.unwrap();
    assert_eq!((bounds.lower, bounds.upper), (10.0, 20.0));
}

#[test]
fn load_reports_unreadable_path() {
    let err = PeerConfig::load("/nonexistent/peer_config.json").unwrap_err();
    assert!(err.to_string().contains("Cannot read"), "got {err}");
}
