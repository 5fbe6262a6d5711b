//! Conversion settings read from the environment.
//!
//! A `.env` file in the working directory is honoured. Command line flags take
//! precedence over anything set here.

use crate::date::DateFallback;
use crate::error::Result;
use crate::restore::DEFAULT_RESTORE_OUTPUT;
use crate::store::DEFAULT_DB_OUTPUT;
use std::path::PathBuf;

pub const ENV_DATE_FALLBACK: &str = "HAIRDRESS_DATE_FALLBACK";
pub const ENV_DB_OUTPUT: &str = "HAIRDRESS_DB_OUTPUT";
pub const ENV_RESTORE_OUTPUT: &str = "HAIRDRESS_RESTORE_OUTPUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub date_fallback: DateFallback,
    pub db_output: PathBuf,
    pub restore_output: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            date_fallback: DateFallback::default(),
            db_output: PathBuf::from(DEFAULT_DB_OUTPUT),
            restore_output: PathBuf::from(DEFAULT_RESTORE_OUTPUT),
        }
    }
}

impl ConvertConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DATE_FALLBACK) {
            config.date_fallback = value.parse()?;
        }
        if let Some(value) = lookup(ENV_DB_OUTPUT).filter(|v| !v.trim().is_empty()) {
            config.db_output = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_RESTORE_OUTPUT).filter(|v| !v.trim().is_empty()) {
            config.restore_output = PathBuf::from(value);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert_eq!(config.db_output, PathBuf::from("hairdress_history.db"));
        assert_eq!(config.restore_output, PathBuf::from("hairdress_restore.csv"));
    }

    #[test]
    fn test_overrides() {
        let config = ConvertConfig::from_lookup(lookup(&[
            (ENV_DATE_FALLBACK, "epoch"),
            (ENV_DB_OUTPUT, "out/history.db"),
            (ENV_RESTORE_OUTPUT, " "),
        ]))
        .unwrap();
        assert_eq!(config.date_fallback, DateFallback::Epoch);
        assert_eq!(config.db_output, PathBuf::from("out/history.db"));
        assert_eq!(config.restore_output, PathBuf::from("hairdress_restore.csv"));
    }

    #[test]
    fn test_bad_fallback_is_an_error() {
        assert!(ConvertConfig::from_lookup(lookup(&[(ENV_DATE_FALLBACK, "never")])).is_err());
    }
}
