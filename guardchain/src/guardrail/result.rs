//! The recorded outcome of one guardrail invocation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CheckError;

use super::GuardrailOutput;

/// The result of running one guardrail.
///
/// Produced by [`Guardrail::run`](super::Guardrail::run), immutable once
/// returned, and consumed by chain aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Name of the guardrail that produced this result.
    pub guardrail_name: String,

    /// Whether content satisfies this guardrail's policy.
    pub passed: bool,

    /// Whether this guardrail demanded the chain halt.
    pub blocked: bool,

    /// Human-readable explanation.
    pub reason: Option<String>,

    /// Rewritten content proposed by the guardrail.
    pub modified_content: Option<String>,

    /// Structured diagnostic data.
    pub details: Map<String, Value>,

    /// Wall-clock duration of this check alone.
    pub execution_time_ms: u64,

    /// Whether this result stands in for an infrastructure failure.
    pub errored: bool,
}

impl GuardrailResult {
    /// Record a verdict returned by a check.
    ///
    /// A block is normalized to `passed = false` and always carries a reason.
    pub(crate) fn from_output(name: &str, output: GuardrailOutput, elapsed: Duration) -> Self {
        let GuardrailOutput {
            passed,
            blocked,
            reason,
            modified_content,
            details,
        } = output;
        let reason = match reason {
            None if blocked => Some(format!("Blocked by guardrail '{name}'")),
            other => other,
        };
        Self {
            guardrail_name: name.to_owned(),
            passed: passed && !blocked,
            blocked,
            reason,
            modified_content,
            details,
            execution_time_ms: millis(elapsed),
            errored: false,
        }
    }

    /// Record an infrastructure failure as a non-passing, non-halting result.
    pub(crate) fn from_error(name: &str, err: &CheckError, elapsed: Duration) -> Self {
        let mut details = Map::new();
        details.insert("error".into(), Value::String(err.to_string()));
        details.insert("error_kind".into(), Value::String(err.kind().into()));
        Self {
            guardrail_name: name.to_owned(),
            passed: false,
            blocked: false,
            reason: Some(format!("Guardrail '{name}' failed: {err}")),
            modified_content: None,
            details,
            execution_time_ms: millis(elapsed),
            errored: true,
        }
    }
}

/// Whole milliseconds in `elapsed`, saturating.
pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_without_reason_gets_default() {
        let output = GuardrailOutput {
            passed: true,
            blocked: true,
            reason: None,
            modified_content: None,
            details: Map::new(),
        };
        let result = GuardrailResult::from_output("injection", output, Duration::ZERO);
        assert!(!result.passed);
        assert_eq!(
            result.reason.as_deref(),
            Some("Blocked by guardrail 'injection'")
        );
    }

    #[test]
    fn test_error_result() {
        let err = CheckError::upstream("moderation", "connection reset");
        let result = GuardrailResult::from_error("moderation", &err, Duration::from_millis(12));
        assert!(result.errored);
        assert!(!result.passed);
        assert!(!result.blocked);
        assert_eq!(result.execution_time_ms, 12);
        assert_eq!(result.details["error_kind"], "upstream");
    }
}
