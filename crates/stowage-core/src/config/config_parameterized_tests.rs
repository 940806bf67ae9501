#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Parameterized config JSON parsing tests
// ============================================================================

#[test_case(r#"{"log_level": "info"}"#, "info")]
#[test_case(r#"{"log_level": "debug"}"#, "debug")]
#[test_case(r#"{"log_level": "trace"}"#, "trace")]
fn StowageConfig___log_level_json___parses_correctly(json: &str, expected_level: &str) {
    let config = StowageConfig::from_json(json.as_bytes()).unwrap();
    assert_eq!(config.log_level, expected_level);
}

#[test_case(r#"{"download_buffer_kb": 64}"#, 64)]
#[test_case(r#"{"download_buffer_kb": 1024}"#, 1024)]
#[test_case(r#"{}"#, 512)]
fn StowageConfig___buffer_size_json___parses_correctly(json: &str, expected_kb: usize) {
    let config = StowageConfig::from_json(json.as_bytes()).unwrap();
    assert_eq!(config.download_buffer_kb, expected_kb);
}

#[test_case(r#"{"max_parallel_downloads": 0}"#)]
#[test_case(r#"{"max_parallel_opens": 0}"#)]
#[test_case(r#"{"download_buffer_kb": 0}"#)]
#[test_case(r#"{"directory_name": ""}"#)]
fn StowageConfig___invalid_values___rejected(json: &str) {
    let result = StowageConfig::from_json(json.as_bytes());
    assert!(matches!(result, Err(StowageError::ConfigError(_))));
}

// ============================================================================
// Parameterized log mode tests
// ============================================================================

#[test_case(LogMode::All, "debug", LogLevel::Debug)]
#[test_case(LogMode::All, "warn", LogLevel::Warn)]
#[test_case(LogMode::JustErrors, "debug", LogLevel::Error)]
#[test_case(LogMode::JustErrors, "off", LogLevel::Off)]
fn StowageConfig___effective_log_level___applies_mode(
    mode: LogMode,
    level: &str,
    expected: LogLevel,
) {
    let config = StowageConfig {
        log_mode: mode,
        log_level: level.to_string(),
        ..Default::default()
    };

    assert_eq!(config.effective_log_level(), expected);
}
