use crate::core::fingerprint::HashAlgorithm;
use std::time::Duration;
use thiserror::Error;

/// Maximum Hamming distance (inclusive) for two logos to share a group.
pub const DEFAULT_THRESHOLD: u32 = 5;

/// Side of the hashing grid; 8 gives 64-bit fingerprints.
pub const DEFAULT_HASH_SIZE: u32 = 8;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hash size must be at least 1")]
    ZeroHashSize,

    #[error("At least one resolve attempt is required")]
    ZeroRetries,

    #[error("Unknown hash algorithm: {name}")]
    UnknownAlgorithm { name: String },
}

/// Parameters shared by fingerprint extraction and grouping.
///
/// Fingerprints are only comparable when produced with the same
/// `algorithm` and `hash_size`, so changing either means re-hashing
/// every logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingConfig {
    pub threshold: u32,
    pub hash_size: u32,
    pub algorithm: HashAlgorithm,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            hash_size: DEFAULT_HASH_SIZE,
            algorithm: HashAlgorithm::default(),
        }
    }
}

impl GroupingConfig {
    /// Bits per fingerprint; `threshold` counts differences out of these.
    pub fn bit_len(&self) -> usize {
        self.algorithm.bit_len(self.hash_size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_size == 0 {
            return Err(ConfigError::ZeroHashSize);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub scrape_timeout: Duration,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
