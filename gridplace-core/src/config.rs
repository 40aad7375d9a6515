use std::{num::NonZeroU32, path::Path, time::Duration};

use gridplace_model::{ImageDimensions, UrlAllowList};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PlacementError, Result},
    fetch::RetryPolicy,
};

/// Largest accepted `retry.backoff_multiplier`.
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Knobs for one placement pipeline.
///
/// All fields carry defaults so a config file only needs the keys it
/// changes; an empty document yields [`PlacementConfig::default`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    /// Which URLs may be processed at all.
    pub allow_list: AllowListConfig,
    /// Per-URL fetch retry policy.
    pub retry: RetryConfig,
    /// Fallback and scaling defaults for dimension resolution.
    pub sizing: SizingConfig,
    /// Grid spacing.
    pub layout: LayoutConfig,
    /// Pause between consecutive URLs (milliseconds).
    pub pacing_ms: u64,
    /// Storage key prefix for cached sizes; the URL is appended.
    pub cache_key_prefix: String,
    /// Pending cache writes kept before new ones are dropped.
    pub cache_queue_capacity: usize,
    /// User-Agent sent with image requests.
    pub user_agent: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            allow_list: AllowListConfig::default(),
            retry: RetryConfig::default(),
            sizing: SizingConfig::default(),
            layout: LayoutConfig::default(),
            pacing_ms: 200,
            cache_key_prefix: "image-size:".to_string(),
            cache_queue_capacity: 256,
            user_agent: concat!("gridplace/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AllowListConfig {
    /// Literal prefix every URL must start with.
    pub scheme_prefix: String,
    /// Substring the URL must contain after the prefix.
    pub host_fragment: String,
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            scheme_prefix: "https://".to_string(),
            host_fragment: "cdn.example.com".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after every failed attempt.
    pub backoff_multiplier: f64,
    /// Hard cap on a single attempt (milliseconds).
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            backoff_multiplier: 1.5,
            attempt_timeout_ms: 15_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SizingConfig {
    /// Cap used for scaled placement when the request does not name one.
    pub default_max_size: u32,
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            default_max_size: 1_000,
            fallback_width: 1_600,
            fallback_height: 2_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between adjacent columns and rows.
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { padding: 20.0 }
    }
}

impl PlacementConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| PlacementError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            PlacementError::Config(format!(
                "failed to read {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allow_list.scheme_prefix.is_empty() {
            return Err(PlacementError::Config(
                "allow_list.scheme_prefix must not be empty".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(PlacementError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if !(1.0..=MAX_BACKOFF_MULTIPLIER)
            .contains(&self.retry.backoff_multiplier)
        {
            return Err(PlacementError::Config(format!(
                "retry.backoff_multiplier must be between 1 and {MAX_BACKOFF_MULTIPLIER}"
            )));
        }
        if self.retry.attempt_timeout_ms == 0 {
            return Err(PlacementError::Config(
                "retry.attempt_timeout_ms must be positive".into(),
            ));
        }
        self.fallback_dimensions()?;
        self.default_max_size()?;
        if !(self.layout.padding >= 0.0 && self.layout.padding.is_finite()) {
            return Err(PlacementError::Config(
                "layout.padding must be a finite, non-negative number".into(),
            ));
        }
        if self.cache_queue_capacity == 0 {
            return Err(PlacementError::Config(
                "cache_queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn allow_list(&self) -> UrlAllowList {
        UrlAllowList::new(
            self.allow_list.scheme_prefix.clone(),
            self.allow_list.host_fragment.clone(),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
            attempt_timeout: Duration::from_millis(
                self.retry.attempt_timeout_ms,
            ),
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn fallback_dimensions(&self) -> Result<ImageDimensions> {
        ImageDimensions::try_from((
            self.sizing.fallback_width,
            self.sizing.fallback_height,
        ))
        .map_err(|err| {
            PlacementError::Config(format!("invalid fallback size: {err}"))
        })
    }

    pub fn default_max_size(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.sizing.default_max_size).ok_or_else(|| {
            PlacementError::Config(
                "sizing.default_max_size must be positive".into(),
            )
        })
    }
}
