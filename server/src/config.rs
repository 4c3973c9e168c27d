//! Runtime configuration read from environment variables.
//!
//! - `HOST`: bind address, default `127.0.0.1`
//! - `PORT`: bind port, default `3000`
//! - `DATABASE_PATH`: SQLite file, default `todos.db`; `:memory:` keeps the
//!   data in process memory

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid HOST {0:?}: expected an IP address")]
    InvalidHost(String),

    #[error("invalid PORT {0:?}: expected a number between 0 and 65535")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            database_path: PathBuf::from("todos.db"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty or whitespace-only values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let host = match var("HOST") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidHost(value))?,
            None => defaults.host,
        };
        let port = match var("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort(value))?,
            None => defaults.port,
        };
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        Ok(Self {
            host,
            port,
            database_path,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().to_string(), "127.0.0.1:3000");
        assert!(!config.in_memory());
    }

    #[test]
    fn reads_all_variables() {
        let config = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8787"),
            ("DATABASE_PATH", ":memory:"),
        ])
        .unwrap();
        assert_eq!(config.addr().to_string(), "0.0.0.0:8787");
        assert!(config.in_memory());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        assert_eq!(config(&[("PORT", "  ")]).unwrap().port, 3000);
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            config(&[("PORT", "http")]),
            Err(ConfigError::InvalidPort("http".to_string()))
        );
        assert!(config(&[("PORT", "70000")]).is_err());
    }

    #[test]
    fn rejects_bad_host() {
        assert_eq!(
            config(&[("HOST", "localhost")]),
            Err(ConfigError::InvalidHost("localhost".to_string()))
        );
    }
}
