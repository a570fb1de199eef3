use std::{collections::HashMap, net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::{
    DEFAULT_BIND_ADDRESS, DEFAULT_MAX_CONNECTIONS, DEFAULT_MEDIA_ROOT, DEFAULT_MEDIA_URL,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub jwt_secret: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment, after loading `.env` when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {e}");
        }

        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            vars.get(key)
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str, default: &str| {
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let bind_address = optional("BIND_ADDRESS", DEFAULT_BIND_ADDRESS);
        let bind_address = bind_address
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDRESS",
                value: bind_address.clone(),
            })?;

        let max_connections = optional(
            "DATABASE_MAX_CONNECTIONS",
            &DEFAULT_MAX_CONNECTIONS.to_string(),
        );
        let max_connections = max_connections
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: max_connections.clone(),
            })?;

        let mut media_url = optional("MEDIA_URL", DEFAULT_MEDIA_URL);
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address,
            jwt_secret: required("JWT_SECRET")?,
            media_root: PathBuf::from(optional("MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
            media_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_to_optional_settings() {
        let config = Config::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn missing_secret_fails() {
        let result = Config::from_vars(&vars(&[("DATABASE_URL", "postgres://localhost/foodgram")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn media_url_gets_trailing_slash() {
        let config = Config::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
            ("MEDIA_URL", "https://cdn.example.com/media"),
        ]))
        .unwrap();

        assert_eq!(config.media_url, "https://cdn.example.com/media/");
    }

    #[test]
    fn invalid_bind_address_is_reported() {
        let result = Config::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
            ("BIND_ADDRESS", "nowhere"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "BIND_ADDRESS", .. })));
    }
}
