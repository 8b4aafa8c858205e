//! Execution settings of a fit container.

use serde::{Deserialize, Serialize};

/// How often a fit job is handed to the solver before giving up.
///
/// The solver sees the identical job on every attempt; a retry only helps
/// solvers with internal randomness or flaky numerical paths. The default
/// allows one retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// A single attempt, no retry.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Number of attempts actually made; at least one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

/// Settings that shape how a fit is run and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Samples of the fitted curve per input sample (1-D fits only).
    pub granularity: usize,
    pub retry: RetryPolicy,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            granularity: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl FitSettings {
    pub fn with_granularity(mut self, granularity: usize) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FitSettings::default();
        assert_eq!(settings.granularity, 10);
        assert_eq!(settings.retry.attempts(), 2);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0).attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
    }

    #[test]
    fn test_settings_from_json() {
        let settings: FitSettings =
            serde_json::from_str(r#"{"retry": {"max_attempts": 3}}"#).unwrap();
        assert_eq!(settings.granularity, 10);
        assert_eq!(settings.retry.attempts(), 3);
    }
}
