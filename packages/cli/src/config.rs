// ABOUTME: Server configuration read from the environment
// ABOUTME: Port, bind host, CORS origin, database location and Anthropic settings

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;

use reqtrack_ai::AIConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origin: String,
    pub database_path: PathBuf,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub anthropic_base_url: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "4001".to_string());

        let port = port_str.parse::<u16>()?;

        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        if host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidHost(host));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_path = non_empty_var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(reqtrack_core::database_file);

        Ok(Config {
            port,
            host,
            cors_origin,
            database_path,
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            anthropic_model: non_empty_var("ANTHROPIC_MODEL"),
            anthropic_base_url: non_empty_var("ANTHROPIC_BASE_URL"),
        })
    }

    /// Anthropic client settings; None when no API key is configured
    pub fn ai_config(&self) -> Option<AIConfig> {
        let api_key = self.anthropic_api_key.clone()?;
        let defaults = AIConfig::default();
        Some(AIConfig {
            api_key: Some(api_key),
            model: self.anthropic_model.clone().unwrap_or(defaults.model),
            base_url: self.anthropic_base_url.clone().unwrap_or(defaults.base_url),
        })
    }
}
