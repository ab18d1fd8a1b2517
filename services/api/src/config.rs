//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the planner keeps its key-value records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// One file per key under a data directory.
    File { data_dir: PathBuf },
    /// A single `kv_store` table in Postgres.
    Postgres { database_url: String },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_level: Level,
    /// Groups used to build the first selection when nothing is stored yet.
    pub default_groups: Vec<u32>,
}

fn parse_groups(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let groups = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(u32::from_str)
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|e| ConfigError::InvalidValue("DEFAULT_GROUPS".to_string(), e.to_string()))?;
    if groups.is_empty() {
        return Err(ConfigError::InvalidValue(
            "DEFAULT_GROUPS".to_string(),
            "at least one group is required".to_string(),
        ));
    }
    Ok(groups)
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "file".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "file" => StorageBackend::File {
                data_dir: std::env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data")),
            },
            "postgres" => StorageBackend::Postgres {
                database_url: std::env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of 'file' or 'postgres'", other),
                ))
            }
        };

        // --- Planner ---
        let default_groups = match std::env::var("DEFAULT_GROUPS") {
            Ok(raw) => parse_groups(&raw)?,
            Err(_) => vec![30],
        };

        Ok(Self {
            bind_address,
            storage,
            log_level,
            default_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_comma_separated() {
        assert_eq!(parse_groups("29, 30").unwrap(), vec![29, 30]);
        assert_eq!(parse_groups("30,").unwrap(), vec![30]);
    }

    #[test]
    fn invalid_groups_are_rejected() {
        assert!(matches!(parse_groups("x"), Err(ConfigError::InvalidValue(..))));
        assert!(matches!(parse_groups(" , "), Err(ConfigError::InvalidValue(..))));
    }
}
