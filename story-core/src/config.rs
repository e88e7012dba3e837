//! Limits for a single story generation run.
//!
//! A [`GenerationConfig`] is validated once, when it is built, and is
//! immutable afterwards. Zero values are rejected rather than clamped.

use std::time::Duration;
use thiserror::Error;

/// Errors from invalid generation settings.
///
/// These are never retried: the run fails before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_depth must be greater than zero")]
    ZeroMaxDepth,

    #[error("max_retries_per_segment must be greater than zero")]
    ZeroRetries,

    #[error("max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("inspiration_word_count must be greater than zero")]
    ZeroInspirationWords,

    #[error("Vocabulary has no genres to choose from")]
    NoGenres,

    #[error(
        "Requested {requested} inspiration words but the vocabulary only has {available} distinct words"
    )]
    NotEnoughInspirationWords { requested: usize, available: usize },
}

/// Validated settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    max_depth: u32,
    max_retries_per_segment: u32,
    max_requests: u32,
    inspiration_word_count: usize,
    min_delay_between_requests: Duration,
}

impl GenerationConfig {
    /// Default deepest level; the root is depth 0.
    pub const DEFAULT_MAX_DEPTH: u32 = 3;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_MAX_REQUESTS: u32 = 40;
    pub const DEFAULT_INSPIRATION_WORDS: usize = 3;
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

    /// Create a config, failing on the first invalid value.
    pub fn new(
        max_depth: u32,
        max_retries_per_segment: u32,
        max_requests: u32,
        inspiration_word_count: usize,
        min_delay_between_requests: Duration,
    ) -> Result<Self, ConfigError> {
        if max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if max_retries_per_segment == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if inspiration_word_count == 0 {
            return Err(ConfigError::ZeroInspirationWords);
        }

        Ok(Self {
            max_depth,
            max_retries_per_segment,
            max_requests,
            inspiration_word_count,
            min_delay_between_requests,
        })
    }

    /// Start from the defaults and override individual settings.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }

    /// Deepest depth a node may have. Nodes at this depth are always endings.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Backend attempts allowed for a single segment.
    pub fn max_retries_per_segment(&self) -> u32 {
        self.max_retries_per_segment
    }

    /// Total backend calls allowed for the whole run.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn inspiration_word_count(&self) -> usize {
        self.inspiration_word_count
    }

    pub fn min_delay_between_requests(&self) -> Duration {
        self.min_delay_between_requests
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_retries_per_segment: Self::DEFAULT_MAX_RETRIES,
            max_requests: Self::DEFAULT_MAX_REQUESTS,
            inspiration_word_count: Self::DEFAULT_INSPIRATION_WORDS,
            min_delay_between_requests: Self::DEFAULT_MIN_DELAY,
        }
    }
}

/// Builder for [`GenerationConfig`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct GenerationConfigBuilder {
    max_depth: u32,
    max_retries_per_segment: u32,
    max_requests: u32,
    inspiration_word_count: usize,
    min_delay_between_requests: Duration,
}

impl Default for GenerationConfigBuilder {
    fn default() -> Self {
        Self {
            max_depth: GenerationConfig::DEFAULT_MAX_DEPTH,
            max_retries_per_segment: GenerationConfig::DEFAULT_MAX_RETRIES,
            max_requests: GenerationConfig::DEFAULT_MAX_REQUESTS,
            inspiration_word_count: GenerationConfig::DEFAULT_INSPIRATION_WORDS,
            min_delay_between_requests: GenerationConfig::DEFAULT_MIN_DELAY,
        }
    }
}

impl GenerationConfigBuilder {
    /// Set the maximum tree depth.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set how many attempts each segment gets.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries_per_segment = retries;
        self
    }

    /// Set the total backend call budget.
    pub fn with_max_requests(mut self, requests: u32) -> Self {
        self.max_requests = requests;
        self
    }

    /// Set how many inspiration words are drawn.
    pub fn with_inspiration_words(mut self, count: usize) -> Self {
        self.inspiration_word_count = count;
        self
    }

    /// Set the minimum gap between backend calls.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay_between_requests = delay;
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        GenerationConfig::new(
            self.max_depth,
            self.max_retries_per_segment,
            self.max_requests,
            self.inspiration_word_count,
            self.min_delay_between_requests,
        )
    }
}
