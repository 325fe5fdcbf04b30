//! Configuration types for guardrail chains.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default end-to-end budget for one chain run.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// How a direction's guardrails are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Blocking guardrails run concurrently first, then non-blocking ones.
    #[default]
    Parallel,
    /// Guardrails run one at a time in configured order, each seeing the
    /// content as rewritten by the ones before it.
    Sequential,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        })
    }
}

/// Verdict applied when the chain budget elapses before it concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Judge only the results that completed; content stays unmodified.
    #[default]
    FailOpen,
    /// Treat the timeout itself as a block.
    FailClosed,
}

/// Which rewrite wins when several parallel guardrails modify content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The last result to complete wins. Not deterministic across runs.
    #[default]
    LastCompleted,
    /// The guardrail configured last among those proposing a rewrite wins.
    ConfigOrder,
}

/// Chain-wide execution settings.
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "mode": "sequential", "timeout_ms": 2000, "on_timeout": "fail_closed" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Scheduling strategy.
    pub mode: ExecutionMode,
    /// End-to-end budget for one chain run, in milliseconds.
    pub timeout_ms: u64,
    /// Verdict policy on timeout.
    pub on_timeout: TimeoutPolicy,
    /// Parallel-mode rewrite resolution.
    pub merge: MergePolicy,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            on_timeout: TimeoutPolicy::default(),
            merge: MergePolicy::default(),
        }
    }
}

impl ChainSettings {
    /// Parse settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on malformed input and
    /// [`Error::Config`](crate::Error::Config) if the settings are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The chain budget as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check invariants that cannot be expressed in the type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] when `timeout_ms` is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults() {
        let settings = ChainSettings::default();
        assert_eq!(settings.mode, ExecutionMode::Parallel);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.on_timeout, TimeoutPolicy::FailOpen);
        assert_eq!(settings.merge, MergePolicy::LastCompleted);
    }

    #[test]
    fn test_from_json_partial() {
        let settings =
            ChainSettings::from_json(r#"{"mode":"sequential","on_timeout":"fail_closed"}"#)
                .unwrap();
        assert_eq!(settings.mode, ExecutionMode::Sequential);
        assert_eq!(settings.on_timeout, TimeoutPolicy::FailClosed);
        assert_eq!(settings.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_from_json_rejects_zero_timeout() {
        let err = ChainSettings::from_json(r#"{"timeout_ms":0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_from_json_rejects_unknown_mode() {
        let err = ChainSettings::from_json(r#"{"mode":"random"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
