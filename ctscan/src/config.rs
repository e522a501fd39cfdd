// SPDX-License-Identifier: Apache-2.0
//! Settings loaded from the environment at startup. No config crate: plain
//! `std::env::var` lookups with defaults, same shape as the rest of the
//! workspace's hand-rolled parsing.

use std::env;

const DEFAULT_WORKER_COUNT: usize = 15;
const DEFAULT_QUEUE_CAPACITY: usize = 3000;
const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_MAX_BLOCK_SIZE: u64 = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub max_block_size: u64,
    /// Belongs to the out-of-scope read-side service; parsed here only so a
    /// shared `.env` doesn't fail startup, never acted on beyond a log line.
    pub debug_memory: bool,
    pub extra_denylist: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: database_url_from_env(),
            worker_count: parse_env("WORKER_COUNT", DEFAULT_WORKER_COUNT),
            queue_capacity: parse_env("QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            batch_size: parse_env("BATCH_SIZE", DEFAULT_BATCH_SIZE),
            max_block_size: parse_env("MAX_BLOCK_SIZE", DEFAULT_MAX_BLOCK_SIZE),
            debug_memory: env::var("DEBUG_MEMORY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            extra_denylist: env::var("CT_LOG_DENYLIST")
                .map(|v| v.split(',').map(str::trim).map(String::from).collect())
                .unwrap_or_default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// `DATABASE_URL` wins outright; otherwise a Postgres URL is assembled from
/// the discrete `PGHOST`/`PGPORT`/`PGDATABASE`/`PGUSER`/`PGPASSWORD` vars
/// `sqlx`'s own tooling conventionally reads.
fn database_url_from_env() -> String {
    if let Ok(url) = env::var("DATABASE_URL") {
        return url;
    }
    let host = env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
    let database = env::var("PGDATABASE").unwrap_or_else(|_| "ctscan".to_string());
    let user = env::var("PGUSER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("PGPASSWORD").unwrap_or_default();
    format!("postgres://{user}:{password}@{host}:{port}/{database}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        env::remove_var("CTSCAN_TEST_MISSING_KEY");
        assert_eq!(parse_env("CTSCAN_TEST_MISSING_KEY", 42usize), 42);
    }

    #[test]
    fn parse_env_reads_present_value() {
        env::set_var("CTSCAN_TEST_PRESENT_KEY", "7");
        assert_eq!(parse_env("CTSCAN_TEST_PRESENT_KEY", 42usize), 7);
        env::remove_var("CTSCAN_TEST_PRESENT_KEY");
    }
}
