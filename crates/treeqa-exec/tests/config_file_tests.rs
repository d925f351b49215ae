use std::io::Write;
use treeqa_exec::{ConfigError, EndpointConfig, QuestionAnswerer};

#[test]
fn loads_config_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{"url": "http://localhost:8890/sparql", "timeout_secs": 7, "batch_size": 25}}"#
    )
    .expect("write config");

    let config = EndpointConfig::from_json_file(file.path()).expect("load");
    assert_eq!(config.url, "http://localhost:8890/sparql");
    assert_eq!(config.timeout_secs, 7);
    assert_eq!(config.batch_size, 25);
    config.validate().expect("valid");

    let answerer = QuestionAnswerer::from_config(&config).expect("answerer");
    assert_eq!(answerer.executor().batcher().batch_size(), 25);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let err = EndpointConfig::from_json_file(&path).expect_err("should fail");
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"), "{err}");
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "url = 'toml is not json'").expect("write config");
    let err = EndpointConfig::from_json_file(file.path()).expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
}
