//! Error types for the guardrail engine.
//!
//! Two very different failure classes live here:
//! - [`ConfigError`] is raised while a chain is being built and is the only
//!   error that ever reaches the caller loudly.
//! - [`CheckError`] is an infrastructure failure raised by a single check.
//!   The engine absorbs it at the per-check boundary and records it as a
//!   non-passing [`GuardrailResult`](crate::GuardrailResult).

use crate::guardrail::Direction;

/// Result type alias for guardchain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the guardchain crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Chain configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error raised while constructing a chain or a built-in check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Two guardrails in the same direction share a name.
    #[error("Duplicate {direction} guardrail name '{name}'")]
    DuplicateGuardrail {
        /// Direction whose list contains the duplicate.
        direction: Direction,
        /// The duplicated name.
        name: String,
    },

    /// A guardrail was registered with an empty name.
    #[error("Empty guardrail name in {direction} chain")]
    EmptyName {
        /// Direction whose list contains the unnamed guardrail.
        direction: Direction,
    },

    /// The chain timeout is zero.
    #[error("Chain timeout must be greater than zero")]
    InvalidTimeout,

    /// A regular expression handed to a built-in check does not compile.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler message from the regex engine.
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid pattern error from a regex compile failure.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, err: &regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: err.to_string(),
        }
    }
}

/// Infrastructure failure raised by a guardrail check.
///
/// Returning this from [`GuardrailCheck::check`](crate::GuardrailCheck::check)
/// means "I could not decide", not "the content is bad". Content verdicts
/// are expressed through [`GuardrailOutput`](crate::GuardrailOutput).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CheckError {
    /// The check failed while evaluating content.
    #[error("Execution error: {0}")]
    Execution(String),

    /// An external dependency of the check failed.
    #[error("Upstream '{service}' failed: {message}")]
    Upstream {
        /// Name of the external service.
        service: String,
        /// Failure description.
        message: String,
    },

    /// The check observed its cancellation token and gave up.
    #[error("Check was cancelled")]
    Cancelled,

    /// The check panicked.
    #[error("Check panicked: {0}")]
    Panicked(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl CheckError {
    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create an upstream service error.
    #[must_use]
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable label, recorded in result details.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Execution(_) => "execution",
            Self::Upstream { .. } => "upstream",
            Self::Cancelled => "cancelled",
            Self::Panicked(_) => "panicked",
            Self::Other(_) => "other",
        }
    }
}

impl From<String> for CheckError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for CheckError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::DuplicateGuardrail {
            direction: Direction::Input,
            name: "length".into(),
        };
        assert_eq!(err.to_string(), "Duplicate input guardrail name 'length'");
    }

    #[test]
    fn test_check_error_kind() {
        assert_eq!(CheckError::execution("boom").kind(), "execution");
        assert_eq!(CheckError::upstream("moderation", "503").kind(), "upstream");
        assert_eq!(CheckError::from("x"), CheckError::Other("x".into()));
    }

    #[test]
    fn test_error_from_config() {
        let err: Error = ConfigError::InvalidTimeout.into();
        assert!(matches!(err, Error::Config(ConfigError::InvalidTimeout)));
    }
}
