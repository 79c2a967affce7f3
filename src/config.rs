use std::str::FromStr;

use crate::data::models::{ConfigError, NewSpacingProfile};

pub const DEFAULT_DATABASE_URL: &str = "study.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_SESSION_EXPIRY_DAYS: i64 = 1;
const DEFAULT_PROFILE_NAME: &str = "Standard";
const DEFAULT_PROFILE_INTERVALS: &str = "1,6,24,72,168";
const DEFAULT_PROFILE_EASE: f64 = 2.5;

/// Runtime settings read from the environment (and `.env`)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub pool_size: u32,
    pub session_expiry_days: i64,
    /// Profile registered on startup when none with its name exists
    pub default_profile: NewSpacingProfile,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());

        let pool_size = parse_or(&lookup, "DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(invalid("DB_POOL_SIZE", "0"));
        }

        let session_expiry_days =
            parse_or(&lookup, "SESSION_EXPIRY_DAYS", DEFAULT_SESSION_EXPIRY_DAYS)?;
        if session_expiry_days <= 0 {
            return Err(invalid("SESSION_EXPIRY_DAYS", &session_expiry_days.to_string()));
        }

        let name = lookup("DEFAULT_PROFILE_NAME").unwrap_or_else(|| DEFAULT_PROFILE_NAME.into());
        let intervals = match lookup("DEFAULT_PROFILE_INTERVALS") {
            Some(raw) => parse_intervals(&raw)?,
            None => parse_intervals(DEFAULT_PROFILE_INTERVALS)?,
        };
        let ease_factor = parse_or(&lookup, "DEFAULT_PROFILE_EASE", DEFAULT_PROFILE_EASE)?;

        Ok(Self {
            database_url,
            bind_addr,
            pool_size,
            session_expiry_days,
            default_profile: NewSpacingProfile::new(name, intervals, ease_factor)?,
        })
    }

    pub fn session_expiry(&self) -> time::Duration {
        time::Duration::days(self.session_expiry_days)
    }
}

/// Parses a comma-separated list of hour intervals, e.g. `"1, 6, 24"`.
pub fn parse_intervals(raw: &str) -> Result<Vec<i64>, ConfigError> {
    let intervals = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| invalid("DEFAULT_PROFILE_INTERVALS", raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if intervals.is_empty() {
        return Err(ConfigError::EmptyIntervals);
    }
    Ok(intervals)
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, &raw)),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key,
        value: value.to_string(),
    }
}
