use std::fs;
use std::time::Duration;

use serde_json::json;
use similar_asserts::assert_eq;
use statsdaemon_config::{Config, ConfigErrorKind, OutputMode, OverridableConfig};
use statsdaemon_log::{Level, LogFormat};

fn thresholds(config: &Config) -> Vec<i64> {
    config.percentiles().iter().map(|p| p.threshold()).collect()
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_path(dir.path()).unwrap();

    assert_eq!(config.path(), dir.path());
    assert_eq!(config.listen_addr(), "0.0.0.0:8125".parse().unwrap());
    assert_eq!(config.flush_interval(), Duration::from_secs(10));
    assert_eq!(thresholds(&config), [90]);
}

#[test]
fn test_load_yaml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.yml"),
        r#"
daemon:
  listen_addr: 127.0.0.1:9125
  receivers: 4
aggregator:
  flush_interval: 60
  percentiles: [99, "-75"]
  prefix_internal: ""
output:
  mode: file
  path: /var/lib/statsdaemon/out.txt
logging:
  level: debug
  format: json
"#,
    )
    .unwrap();

    let config = Config::from_path(dir.path()).unwrap();

    assert_eq!(config.listen_addr(), "127.0.0.1:9125".parse().unwrap());
    assert_eq!(config.max_packet_size(), 1472);
    assert_eq!(config.receivers(), 4);
    assert_eq!(config.flush_interval(), Duration::from_secs(60));
    assert_eq!(thresholds(&config), [99, -75]);
    assert_eq!(config.prefix_internal(), "");
    assert_eq!(config.output_mode(), OutputMode::File);
    assert_eq!(
        config.output_path().unwrap().to_str(),
        Some("/var/lib/statsdaemon/out.txt")
    );
    assert_eq!(config.logging().level, Level::Debug);
    assert_eq!(config.logging().format, LogFormat::Json);
}

#[test]
fn test_bad_yaml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yml"), "daemon: [").unwrap();

    let error = Config::from_path(dir.path()).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::BadYaml);
    assert!(error.to_string().contains("config.yml"));
}

#[test]
fn test_invalid_percentile_in_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.yml"),
        "aggregator:\n  percentiles: [100]\n",
    )
    .unwrap();

    let error = Config::from_path(dir.path()).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::BadYaml);
}

#[test]
fn test_from_json_value() {
    let config = Config::from_json_value(json!({
        "aggregator": {
            "flush_interval": 1,
            "percentiles": ["50", "-50"],
        },
        "output": {
            "mode": "discard",
        },
    }))
    .unwrap();

    assert_eq!(config.flush_interval(), Duration::from_secs(1));
    assert_eq!(thresholds(&config), [50, -50]);
    assert_eq!(config.output_mode(), OutputMode::Discard);

    let aggregator = config.aggregator_config();
    assert_eq!(aggregator.flush_interval, Duration::from_secs(1));
    assert_eq!(aggregator.prefix_internal, "statsdaemon");
}

#[test]
fn test_validation() {
    let error = Config::from_json_value(json!({"aggregator": {"flush_interval": 0}})).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::InvalidValue);
    assert_eq!(
        error.to_string(),
        "invalid config value (field flush_interval)"
    );

    let error = Config::from_json_value(json!({"daemon": {"receivers": 0}})).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::InvalidValue);

    let error = Config::from_json_value(json!({"output": {"mode": "file"}})).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::MissingOutputPath);

    let error = Config::from_json_value(json!({"output": {"mode": "kafka"}})).unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::BadJson);
}

#[test]
fn test_apply_override() {
    let mut config = Config::from_json_value(json!({})).unwrap();

    config
        .apply_override(OverridableConfig {
            listen_addr: Some("127.0.0.1:18125".to_owned()),
            graphite_addr: Some("graphite.internal:2003".to_owned()),
            flush_interval: Some("5".to_owned()),
            percentiles: vec!["95".to_owned(), "-5".to_owned()],
            prefix_internal: Some("sd".to_owned()),
            output: Some("stdout".to_owned()),
            output_path: None,
        })
        .unwrap();

    assert_eq!(config.listen_addr(), "127.0.0.1:18125".parse().unwrap());
    assert_eq!(config.graphite_addr(), "graphite.internal:2003");
    assert_eq!(config.flush_interval(), Duration::from_secs(5));
    assert_eq!(thresholds(&config), [95, -5]);
    assert_eq!(config.prefix_internal(), "sd");
    assert_eq!(config.output_mode(), OutputMode::Stdout);
}

#[test]
fn test_apply_override_empty_keeps_values() {
    let mut config = Config::from_json_value(json!({"aggregator": {"percentiles": [75]}})).unwrap();
    config.apply_override(OverridableConfig::default()).unwrap();
    assert_eq!(thresholds(&config), [75]);
}

#[test]
fn test_apply_override_invalid() {
    let mut config = Config::from_json_value(json!({})).unwrap();

    let error = config
        .apply_override(OverridableConfig {
            percentiles: vec!["0".to_owned()],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(error.to_string(), "invalid config value (field percentile)");

    let error = config
        .apply_override(OverridableConfig {
            flush_interval: Some("soon".to_owned()),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid config value (field flush_interval)"
    );

    let error = config
        .apply_override(OverridableConfig {
            output: Some("file".to_owned()),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(error.kind(), ConfigErrorKind::MissingOutputPath);
}

#[test]
fn test_yaml_dump_loads_back() {
    let mut config = Config::from_json_value(json!({})).unwrap();
    config
        .apply_override(OverridableConfig {
            percentiles: vec!["90".to_owned(), "-10".to_owned()],
            output: Some("file".to_owned()),
            output_path: Some("/tmp/statsdaemon.out".to_owned()),
            ..Default::default()
        })
        .unwrap();

    let yaml = config.to_yaml_string().unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yml"), yaml).unwrap();
    let loaded = Config::from_path(dir.path()).unwrap();

    assert_eq!(thresholds(&loaded), [90, -10]);
    assert_eq!(loaded.output_mode(), OutputMode::File);
    assert_eq!(loaded.listen_addr(), config.listen_addr());
    assert_eq!(loaded.graphite_addr(), config.graphite_addr());
}
