//! Configuration loading and representation.
//!
//! Everything comes from environment variables, read once at startup.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 720;
const DEV_SESSION_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Which storage backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub session_secret: String,
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse(
            "BIND_ADDR",
            get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let store = match get("DATABASE_URL") {
            Some(url) => StoreConfig::Postgres {
                url,
                max_connections: match get("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => parse("DATABASE_MAX_CONNECTIONS", v)?,
                    None => DEFAULT_MAX_CONNECTIONS,
                },
            },
            None => StoreConfig::InMemory,
        };

        let session_secret = get("SESSION_SECRET").unwrap_or_else(|| {
            tracing::warn!("SESSION_SECRET not set; using insecure dev default");
            DEV_SESSION_SECRET.to_string()
        });

        let session_ttl_minutes: i64 = match get("SESSION_TTL_MINUTES") {
            Some(v) => parse("SESSION_TTL_MINUTES", v)?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };
        if session_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            store,
            session_secret,
            session_ttl_minutes,
        })
    }
}

fn parse<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_select_in_memory_store() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.store, StoreConfig::InMemory);
        assert_eq!(cfg.session_secret, "dev-secret");
        assert_eq!(cfg.session_ttl_minutes, DEFAULT_SESSION_TTL_MINUTES);
    }

    #[test]
    fn database_url_selects_postgres() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/stockroom"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("SESSION_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreConfig::Postgres {
                url: "postgres://localhost/stockroom".to_string(),
                max_connections: 12,
            }
        );
        assert_eq!(cfg.session_secret, "s3cret");
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("SESSION_TTL_MINUTES", "0")]),
            Err(ConfigError::Invalid { var: "SESSION_TTL_MINUTES", .. })
        ));
    }
}
