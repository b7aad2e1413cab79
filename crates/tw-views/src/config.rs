//! Browser configuration.

use serde::{Deserialize, Serialize};
use tw_core::LastPage;
use tw_data::BrowseError;

/// Retry policy for the background overview queries.
///
/// Each failed sample is retried after a delay that doubles per attempt,
/// starting at `base_delay_ms`. Once `attempts` tries have failed the
/// column is reported as unavailable instead of looping forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay_ms: 50,
        }
    }
}

/// Tunables for [`crate::TableBrowser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Rows per page.
    pub window_size: u64,
    /// Upper bound on rows examined per column by the overview pass.
    pub sample_cap: u64,
    /// How "last" aligns when the final page would otherwise be short.
    pub last_page: LastPage,
    /// Retry policy for overview sampling.
    pub retry: RetryPolicy,
    /// Maximum cached windows, or `None` for an unbounded cache.
    pub cache_entries: Option<usize>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            sample_cap: 10_000_000,
            last_page: LastPage::default(),
            retry: RetryPolicy::default(),
            cache_entries: None,
        }
    }
}

impl BrowserConfig {
    pub fn validate(&self) -> Result<(), BrowseError> {
        if self.window_size == 0 {
            return Err(BrowseError::Config("window_size must be positive".into()));
        }
        if self.retry.attempts == 0 {
            return Err(BrowseError::Config(
                "retry.attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BrowserConfig::default();
        config.validate().unwrap();
        assert_eq!(config.window_size, 100);
        assert_eq!(config.sample_cap, 10_000_000);
        assert_eq!(config.retry.attempts, 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: BrowserConfig =
            serde_json::from_str(r#"{"window_size": 25, "last_page": "partial"}"#).unwrap();
        assert_eq!(config.window_size, 25);
        assert_eq!(config.last_page, LastPage::Partial);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.cache_entries, None);
    }

    #[test]
    fn round_trips_through_json() {
        let config = BrowserConfig {
            window_size: 50,
            cache_entries: Some(8),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: BrowserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.window_size, 50);
        assert_eq!(back.cache_entries, Some(8));
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let config = BrowserConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
