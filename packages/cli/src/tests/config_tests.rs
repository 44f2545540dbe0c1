use crate::config::{Config, ConfigError};
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const VARS: [&str; 7] = [
    "PORT",
    "HOST",
    "CORS_ORIGIN",
    "DATABASE_PATH",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_MODEL",
    "ANTHROPIC_BASE_URL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, 4001);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.cors_origin, "http://localhost:5173");
    assert_eq!(config.database_path, reqtrack_core::database_file());
    assert!(config.ai_config().is_none());
}

#[test]
#[serial]
fn test_config_from_env_with_all_custom() {
    clear_env();
    env::set_var("PORT", "3000");
    env::set_var("HOST", "0.0.0.0");
    env::set_var("CORS_ORIGIN", "https://app.example.com");
    env::set_var("DATABASE_PATH", "/tmp/reqtrack-test.db");

    let config = Config::from_env().unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.cors_origin, "https://app.example.com");
    assert_eq!(config.database_path, PathBuf::from("/tmp/reqtrack-test.db"));

    clear_env();
}

#[rstest]
#[case("not-a-number")]
#[case("70000")]
#[serial]
fn test_config_invalid_port(#[case] port: &str) {
    clear_env();
    env::set_var("PORT", port);

    let result = Config::from_env();

    assert!(matches!(result, Err(ConfigError::InvalidPort(_))));

    clear_env();
}

#[test]
#[serial]
fn test_config_port_zero() {
    clear_env();
    env::set_var("PORT", "0");

    let result = Config::from_env();

    assert!(matches!(result, Err(ConfigError::PortOutOfRange(0))));

    clear_env();
}

#[test]
#[serial]
fn test_config_invalid_host() {
    clear_env();
    env::set_var("HOST", "localhost:80");

    let result = Config::from_env();

    assert!(matches!(result, Err(ConfigError::InvalidHost(_))));

    clear_env();
}

#[test]
#[serial]
fn test_ai_config_uses_overrides() {
    clear_env();
    env::set_var("ANTHROPIC_API_KEY", "sk-test");
    env::set_var("ANTHROPIC_BASE_URL", "http://127.0.0.1:9999");

    let ai = Config::from_env().unwrap().ai_config().unwrap();

    assert_eq!(ai.api_key.as_deref(), Some("sk-test"));
    assert_eq!(ai.base_url, "http://127.0.0.1:9999");
    assert_eq!(ai.model, reqtrack_ai::AIConfig::default().model);

    clear_env();
}

#[test]
#[serial]
fn test_blank_api_key_disables_ai() {
    clear_env();
    env::set_var("ANTHROPIC_API_KEY", "   ");

    let config = Config::from_env().unwrap();

    assert!(config.ai_config().is_none());

    clear_env();
}
