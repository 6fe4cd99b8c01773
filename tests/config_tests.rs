//! Static configuration tests
//!
//! Loading from TOML files and environment overrides.

use std::io::Write;

use prometheus_exporter::config::StaticConfig;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
[server]
host = "0.0.0.0"
port = 9200
metrics_path = "/stats"
serialize_snapshots = false

[logging]
level = "debug"
format = "json"

[exporter]
default_buckets = [0.1, 0.5, 2.5]

[exporter.default_labels]
service = "billing"
region = "eu"
"#,
    );
    let path = file.path().to_str().unwrap();

    let config = StaticConfig::try_load(Some(path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.server.metrics_path, "/stats");
    assert!(!config.server.serialize_snapshots);
    assert!(config.server.http_metrics);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.exporter.default_labels["service"], "billing");
    assert_eq!(config.exporter.default_labels.len(), 2);
    assert_eq!(config.exporter.default_buckets, Some(vec![0.1, 0.5, 2.5]));

    let exporter = config.exporter.build_exporter().unwrap();
    assert_eq!(exporter.default_buckets(), &[0.1, 0.5, 2.5]);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("[server]\nport = 9300\n");
    let config = StaticConfig::try_load(Some(file.path().to_str().unwrap())).unwrap();

    assert_eq!(config.server.port, 9300);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.metrics_path, "/metrics");
    assert_eq!(config.logging.level, "info");
    assert!(config.exporter.default_labels.is_empty());
}

#[test]
fn test_missing_explicit_file_is_error() {
    let result = StaticConfig::try_load(Some("/nonexistent/exporter-config.toml"));
    assert!(result.is_err());

    let config = StaticConfig::load(Some("/nonexistent/exporter-config.toml"));
    assert_eq!(config.server.port, 9100);
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let file = write_config("[server]\nport = \"not a port\"\n");
    let path = file.path().to_str().unwrap();

    assert!(StaticConfig::try_load(Some(path)).is_err());
    let config = StaticConfig::load(Some(path));
    assert_eq!(config.server.port, 9100);
}

#[test]
fn test_invalid_buckets_rejected_by_exporter() {
    let file = write_config("[exporter]\ndefault_buckets = [1.0, 0.5]\n");
    let config = StaticConfig::try_load(Some(file.path().to_str().unwrap())).unwrap();
    assert!(config.exporter.build_exporter().is_err());
}

#[test]
fn test_env_overrides_file() {
    let file = write_config("[server]\nenum_demo_secs = 30\n");
    // SAFETY: no other test reads or writes this variable.
    unsafe { std::env::set_var("PE__SERVER__ENUM_DEMO_SECS", "3") };

    let config = StaticConfig::try_load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.server.enum_demo_secs, 3);

    unsafe { std::env::remove_var("PE__SERVER__ENUM_DEMO_SECS") };
}

#[test]
fn test_sample_config_parses() {
    let sample = StaticConfig::generate_sample_config();
    let file = write_config(&sample);
    let config = StaticConfig::try_load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.server.metrics_path, "/metrics");
}
