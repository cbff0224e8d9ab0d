//! Dispatch configuration
//!
//! Tunables for submission parallelism and the config store cache.

use std::time::Duration;

use crate::error::{DispatchError, Result};

/// Dispatch configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of pipeline runs submitted concurrently
    pub max_parallel_submissions: usize,

    /// Maximum number of configurations kept by the in-memory store
    pub config_cache_size: usize,

    /// Maximum time a single submission may take
    pub submission_timeout: Duration,
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| DispatchError::Config(format!("{} has an invalid value '{}'", key, value))),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(max_parallel_submissions: usize) -> Self {
        Self {
            max_parallel_submissions,
            config_cache_size: 128,
            submission_timeout: Duration::from_secs(20),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - LATCH_MAX_PARALLEL_SUBMISSIONS (optional, default: number of CPUs)
    /// - LATCH_CONFIG_CACHE_SIZE (optional, default: 128)
    /// - LATCH_SUBMISSION_TIMEOUT (optional, seconds, default: 20)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(parallel) = parse_env::<usize>("LATCH_MAX_PARALLEL_SUBMISSIONS")? {
            config.max_parallel_submissions = parallel;
        }

        if let Some(size) = parse_env::<usize>("LATCH_CONFIG_CACHE_SIZE")? {
            config.config_cache_size = size;
        }

        if let Some(secs) = parse_env::<u64>("LATCH_SUBMISSION_TIMEOUT")? {
            config.submission_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.config_cache_size = size;
        self
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_submissions == 0 {
            return Err(DispatchError::Config(
                "max_parallel_submissions must be greater than 0".to_string(),
            ));
        }

        if self.config_cache_size == 0 {
            return Err(DispatchError::Config(
                "config_cache_size must be greater than 0".to_string(),
            ));
        }

        if self.submission_timeout.is_zero() {
            return Err(DispatchError::Config(
                "submission_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_parallelism())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.max_parallel_submissions >= 1);
        assert_eq!(config.config_cache_size, 128);
        assert_eq!(config.submission_timeout, Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new(2);
        assert!(config.validate().is_ok());

        config.max_parallel_submissions = 0;
        assert!(config.validate().is_err());

        config.max_parallel_submissions = 2;
        config = config.with_cache_size(0);
        assert!(config.validate().is_err());

        config = config
            .with_cache_size(1)
            .with_submission_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
