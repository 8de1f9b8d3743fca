//! Configuration management for the server.

use formsync_engine::ConflictStrategy;
use std::env;

/// Default maximum number of items returned by one pull.
pub const DEFAULT_PULL_LIMIT: usize = 500;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Strategy applied when a form was edited on both sides
    pub conflict_strategy: ConflictStrategy,
    /// Maximum items per pull response
    pub pull_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            conflict_strategy: ConflictStrategy::ServerWins,
            pull_limit: DEFAULT_PULL_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let conflict_strategy = match env::var("CONFLICT_STRATEGY") {
            Ok(raw) => parse_strategy(&raw)?,
            Err(_) => ConflictStrategy::ServerWins,
        };

        let pull_limit = match env::var("PULL_LIMIT") {
            Ok(raw) => raw
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidPullLimit)?,
            Err(_) => DEFAULT_PULL_LIMIT,
        };

        Ok(Self {
            host,
            port,
            conflict_strategy,
            pull_limit,
        })
    }
}

fn parse_strategy(raw: &str) -> Result<ConflictStrategy, ConfigError> {
    match raw.parse::<ConflictStrategy>() {
        Ok(ConflictStrategy::Unrecognized) | Err(_) => {
            Err(ConfigError::InvalidConflictStrategy(raw.to_string()))
        }
        Ok(strategy) => Ok(strategy),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid CONFLICT_STRATEGY value: {0}")]
    InvalidConflictStrategy(String),

    #[error("PULL_LIMIT must be a positive integer")]
    InvalidPullLimit,
}
