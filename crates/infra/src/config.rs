//! Runtime configuration loaded from the environment.
//!
//! `.env` files are honoured via `dotenvy`; real environment variables win.

use std::net::SocketAddr;
use std::time::Duration;

use stockdate_products::DateInputPolicy;

use crate::form_token::MAX_TOKEN_TTL;
use crate::jobs::{MAX_INTERVAL_SECS, Recurrence};

pub const BIND_ADDR_VAR: &str = "STOCKDATE_BIND_ADDR";
pub const SWEEP_SCHEDULE_VAR: &str = "STOCKDATE_SWEEP_SCHEDULE";
pub const POLL_INTERVAL_VAR: &str = "STOCKDATE_POLL_INTERVAL_SECS";
pub const TOKEN_TTL_VAR: &str = "STOCKDATE_TOKEN_TTL_SECS";
pub const DATE_INPUT_VAR: &str = "STOCKDATE_DATE_INPUT";
pub const ADMIN_TOKEN_VAR: &str = "STOCKDATE_ADMIN_TOKEN";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub sweep_schedule: Recurrence,
    pub poll_interval: Duration,
    pub token_ttl: Duration,
    pub date_input: DateInputPolicy,
    /// Bearer token for the admin endpoints. `None` leaves them open.
    pub admin_token: Option<String>,
    /// Postgres connection string. `None` selects the in-memory stores.
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            sweep_schedule: Recurrence::Daily,
            poll_interval: Duration::from_secs(60),
            token_ttl: crate::form_token::DEFAULT_TOKEN_TTL,
            date_input: DateInputPolicy::Permissive,
            admin_token: None,
            database_url: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl AppConfig {
    /// Load from the process environment (after reading `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get(BIND_ADDR_VAR) {
            Some(raw) => raw.parse().map_err(|e| invalid(BIND_ADDR_VAR, e))?,
            None => defaults.bind_addr,
        };

        let sweep_schedule = match get(SWEEP_SCHEDULE_VAR) {
            Some(raw) => Recurrence::parse(&raw).ok_or_else(|| {
                invalid(
                    SWEEP_SCHEDULE_VAR,
                    format!(
                        "unknown schedule '{raw}' (hourly, twicedaily, daily, weekly or 1..={MAX_INTERVAL_SECS} seconds)"
                    ),
                )
            })?,
            None => defaults.sweep_schedule,
        };

        let poll_interval = match get(POLL_INTERVAL_VAR) {
            Some(raw) => Duration::from_secs(positive_secs(POLL_INTERVAL_VAR, &raw)?),
            None => defaults.poll_interval,
        };

        let token_ttl = match get(TOKEN_TTL_VAR) {
            Some(raw) => {
                let secs = positive_secs(TOKEN_TTL_VAR, &raw)?;
                if secs > MAX_TOKEN_TTL.as_secs() {
                    return Err(invalid(
                        TOKEN_TTL_VAR,
                        format!("must be at most {} seconds", MAX_TOKEN_TTL.as_secs()),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.token_ttl,
        };

        let date_input = match get(DATE_INPUT_VAR) {
            Some(raw) => DateInputPolicy::parse(&raw).map_err(|e| invalid(DATE_INPUT_VAR, e))?,
            None => defaults.date_input,
        };

        Ok(Self {
            bind_addr,
            sweep_schedule,
            poll_interval,
            token_ttl,
            date_input,
            admin_token: get(ADMIN_TOKEN_VAR),
            database_url: get(DATABASE_URL_VAR),
        })
    }
}

fn positive_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(var, "must be greater than zero")),
        Ok(secs) => Ok(secs),
        Err(e) => Err(invalid(var, e)),
    }
}

fn invalid(var: &'static str, message: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.to_string(),
    }
}
