use crate::error::ConfigError;
use crate::pronunciation::DEFAULT_HISTORY_LIMIT;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite://nihongo.db?mode=rwc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Scale review intervals by the per-card difficulty weight.
    pub adaptive_intervals: bool,
    pub history_limit: usize,
}

impl Config {
    /// Reads `NIHONGO_*` variables from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "NIHONGO_BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let database_url = lookup("NIHONGO_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let adaptive_intervals = parse_bool(&lookup, "NIHONGO_ADAPTIVE_INTERVALS")?;
        let history_limit: usize = parse_var(&lookup, "NIHONGO_HISTORY_LIMIT", &DEFAULT_HISTORY_LIMIT.to_string())?;

        if history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "NIHONGO_HISTORY_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            database_url,
            adaptive_intervals,
            history_limit,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            adaptive_intervals: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{}' is not a boolean", v),
            }),
        },
    }
}
