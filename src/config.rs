use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL, DEFAULT_QUOTE_API_URL, DEFAULT_QUOTE_TIMEOUT_SECS,
    DEFAULT_SESSION_TTL_HOURS, DEFAULT_STARTING_CASH,
};
use crate::error::CustomError;
use crate::utils::parse_dollars;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub api_key: String,
    pub quote_api_url: String,
    pub quote_timeout_secs: u64,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// Balance given to every new user, in cents.
    pub starting_cash: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        dotenv().ok(); // Load environment variables

        let starting_cash = optional("STARTING_CASH", DEFAULT_STARTING_CASH.to_string());
        let starting_cash = parse_dollars(&starting_cash)
            .filter(|cents| *cents >= 0)
            .ok_or_else(|| CustomError::InvalidEnv("STARTING_CASH".to_string()))?;

        Ok(Config {
            database_url: optional("DATABASE_URL", DEFAULT_DATABASE_URL.to_string()),
            bind_addr: optional("BIND_ADDR", DEFAULT_BIND_ADDR.to_string()),
            api_key: required("API_KEY")?,
            quote_api_url: optional("QUOTE_API_URL", DEFAULT_QUOTE_API_URL.to_string()),
            quote_timeout_secs: parsed("QUOTE_TIMEOUT_SECS", DEFAULT_QUOTE_TIMEOUT_SECS)?,
            session_secret: required("SESSION_SECRET")?,
            session_ttl_hours: parsed("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?,
            starting_cash,
        })
    }
}

fn required(key: &str) -> Result<String, CustomError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(CustomError::EnvError(
            key.to_string(),
            env::VarError::NotPresent,
        )),
        Err(e) => Err(CustomError::EnvError(key.to_string(), e)),
    }
}

fn optional(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, CustomError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| CustomError::InvalidEnv(key.to_string())),
        Err(_) => Ok(default),
    }
}
