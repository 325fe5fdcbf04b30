//! The verdict a single check proposes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The output of a guardrail check function.
///
/// Built with one of the constructors ([`pass`](Self::pass),
/// [`fail`](Self::fail), [`block`](Self::block), [`modify`](Self::modify))
/// and optionally enriched with [`with_detail`](Self::with_detail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailOutput {
    /// Whether content satisfies this check's policy.
    pub passed: bool,

    /// Whether this check demands the chain halt.
    ///
    /// Only honored when the guardrail's descriptor is blocking.
    pub blocked: bool,

    /// Human-readable explanation. Always present on a block.
    pub reason: Option<String>,

    /// Rewritten content, when the check proposes a change.
    pub modified_content: Option<String>,

    /// Structured diagnostic data (matched pattern, scores, fail-open flags).
    pub details: Map<String, Value>,
}

impl GuardrailOutput {
    /// Create a passing output.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            blocked: false,
            reason: None,
            modified_content: None,
            details: Map::new(),
        }
    }

    /// Create a passing output with one diagnostic entry.
    #[must_use]
    pub fn pass_with_info(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::pass().with_detail(key, value)
    }

    /// Create a failing, non-halting output.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
            ..Self::pass()
        }
    }

    /// Create a blocking output. Blocking always implies not passed.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            blocked: true,
            reason: Some(reason.into()),
            ..Self::pass()
        }
    }

    /// Create a passing output that rewrites the content.
    #[must_use]
    pub fn modify(content: impl Into<String>) -> Self {
        Self {
            modified_content: Some(content.into()),
            ..Self::pass()
        }
    }

    /// Attach a diagnostic entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach or replace the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns `true` if the check asked the chain to halt.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// Convenience conversion: a string becomes a blocking output.
impl From<&str> for GuardrailOutput {
    fn from(reason: &str) -> Self {
        Self::block(reason)
    }
}
