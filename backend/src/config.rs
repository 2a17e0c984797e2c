//! Engine configuration read from the environment.

use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_FACET_VALUE_LIMIT: usize = 50;
pub const DEFAULT_SUSPICIOUS_ZERO_RESULT_THRESHOLD: u64 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub clickhouse_url: String,
    pub clickhouse_user: String,
    pub clickhouse_password: String,
    pub clickhouse_database: String,
    pub photos_table: String,
    /// Cap on candidate values returned per facet dimension.
    pub facet_value_limit: usize,
    /// A request that drops to zero results from at least this many is logged
    /// as suspicious.
    pub suspicious_zero_result_threshold: u64,
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clickhouse_url: "http://localhost:8123".to_string(),
            clickhouse_user: "default".to_string(),
            clickhouse_password: String::new(),
            clickhouse_database: "default".to_string(),
            photos_table: "photos".to_string(),
            facet_value_limit: DEFAULT_FACET_VALUE_LIMIT,
            suspicious_zero_result_threshold: DEFAULT_SUSPICIOUS_ZERO_RESULT_THRESHOLD,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);
        let number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().with_context(|| format!("{key} is not a number: {raw:?}")),
                None => Ok(default),
            }
        };

        let facet_value_limit = number("FACET_VALUE_LIMIT", defaults.facet_value_limit as u64)?;
        anyhow::ensure!(facet_value_limit > 0, "FACET_VALUE_LIMIT must be positive");

        Ok(Self {
            clickhouse_url: string("CLICKHOUSE_URL", defaults.clickhouse_url),
            clickhouse_user: string("CLICKHOUSE_USER", defaults.clickhouse_user),
            clickhouse_password: string("CLICKHOUSE_PASSWORD", defaults.clickhouse_password),
            clickhouse_database: string("CLICKHOUSE_DATABASE", defaults.clickhouse_database),
            photos_table: string("PHOTOS_TABLE", defaults.photos_table),
            facet_value_limit: usize::try_from(facet_value_limit).context("FACET_VALUE_LIMIT out of range")?,
            suspicious_zero_result_threshold: number(
                "SUSPICIOUS_ZERO_RESULT_THRESHOLD",
                defaults.suspicious_zero_result_threshold,
            )?,
            request_timeout: Duration::from_millis(number("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?),
        })
    }
}
