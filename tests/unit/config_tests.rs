// Configuration loading tests

use std::io::Write;

use hikari::config::*;
use hikari::logging::LogFormat;

#[test]
fn test_full_s3_config() {
    let yaml = r#"
server:
  address: "127.0.0.1"
  port: 9090
  request_timeout_secs: 10
  log_format: pretty
origin:
  secret: "abc"
  secret_header: "x-custom-secret"
storage:
  backend: s3
  original_bucket: "originals"
  variant_bucket: "variants"
  region: "eu-west-1"
  endpoint: "http://localhost:9000"
  access_key: "minio"
  secret_key: "minio123"
  force_path_style: true
"#;

    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    assert_eq!(config.server.bind_address(), "127.0.0.1:9090");
    assert_eq!(config.server.log_format, LogFormat::Pretty);
    assert_eq!(config.origin.secret_header, "x-custom-secret");
    assert_eq!(config.storage.backend, StorageBackend::S3);
    assert_eq!(config.storage.region, "eu-west-1");
    assert_eq!(
        config.storage.endpoint.as_deref(),
        Some("http://localhost:9000")
    );
    assert!(config.storage.force_path_style);
}

#[test]
fn test_secret_from_environment() {
    std::env::set_var("HIKARI_IT_ORIGIN_SECRET", "env-secret");
    std::env::set_var("HIKARI_IT_ROOT", "/tmp/hikari");

    let yaml = r#"
origin:
  secret: "${HIKARI_IT_ORIGIN_SECRET}"
storage:
  backend: filesystem
  root: "${HIKARI_IT_ROOT}"
"#;

    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    assert_eq!(config.origin.secret, "env-secret");
    assert_eq!(config.storage.root.as_deref(), Some("/tmp/hikari"));
}

#[test]
fn test_port_zero_is_invalid() {
    let yaml = r#"
server:
  port: 0
origin:
  secret: "abc"
storage:
  backend: memory
"#;

    let config = Config::from_yaml_with_env(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("port"));
}

#[test]
fn test_unknown_backend_is_a_parse_error() {
    let yaml = r#"
origin:
  secret: "abc"
storage:
  backend: ftp
"#;

    let err = Config::from_yaml_with_env(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "origin:\n  secret: \"file-secret\"\nstorage:\n  backend: memory"
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.origin.secret, "file-secret");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
}
