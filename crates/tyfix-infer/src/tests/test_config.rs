//! Tests for loading completion settings

use crate::completer::ConstraintSystemCompleter;
use crate::config::CompletionConfig;
use crate::error::ConfigError;

#[test]
fn test_empty_document_gives_defaults() {
    let config = CompletionConfig::from_toml_str("").unwrap();
    assert_eq!(config, CompletionConfig::default());
    assert_eq!(config.max_passes, 64);
    assert!(config.report_not_enough_information);
}

#[test]
fn test_missing_keys_keep_defaults() {
    let config = CompletionConfig::from_toml_str("[completion]\nmax_passes = 3\n").unwrap();
    assert_eq!(config.max_passes, 3);
    assert!(config.report_not_enough_information);

    let completer = ConstraintSystemCompleter::new(config.clone());
    assert_eq!(completer.config(), &config);
}

#[test]
fn test_zero_passes_is_rejected() {
    let err = CompletionConfig::from_toml_str("[completion]\nmax_passes = 0\n").unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidValue {
            field: "max_passes",
            message: "must be at least 1".to_string(),
        }
    );
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let err = CompletionConfig::from_toml_str("[completion\nmax_passes = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = CompletionConfig::from_toml_str("[completion]\nmax_passes = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
