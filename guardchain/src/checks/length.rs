//! Character-count limit.

use async_trait::async_trait;

use crate::error::CheckError;
use crate::guardrail::{CheckContext, GuardrailCheck, GuardrailOutput};

/// What to do with content over the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthAction {
    /// Reject the content.
    Block,
    /// Keep the first `max_chars` characters.
    Truncate,
}

/// Limits content to a number of characters (Unicode scalar values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLengthCheck {
    max_chars: usize,
    action: LengthAction,
}

impl MaxLengthCheck {
    /// Create a check with an explicit action.
    #[must_use]
    pub const fn new(max_chars: usize, action: LengthAction) -> Self {
        Self { max_chars, action }
    }

    /// Block content longer than `max_chars`.
    #[must_use]
    pub const fn block(max_chars: usize) -> Self {
        Self::new(max_chars, LengthAction::Block)
    }

    /// Truncate content longer than `max_chars`.
    #[must_use]
    pub const fn truncate(max_chars: usize) -> Self {
        Self::new(max_chars, LengthAction::Truncate)
    }
}

#[async_trait]
impl GuardrailCheck for MaxLengthCheck {
    async fn check(
        &self,
        content: &str,
        _ctx: &CheckContext,
    ) -> Result<GuardrailOutput, CheckError> {
        let length = content.chars().count();
        if length <= self.max_chars {
            return Ok(GuardrailOutput::pass_with_info("length", length));
        }

        let output = match self.action {
            LengthAction::Block => GuardrailOutput::block(format!(
                "Content length {length} exceeds limit of {}",
                self.max_chars
            )),
            LengthAction::Truncate => {
                GuardrailOutput::modify(content.chars().take(self.max_chars).collect::<String>())
                    .with_reason(format!("Truncated to {} characters", self.max_chars))
            }
        };
        Ok(output
            .with_detail("length", length)
            .with_detail("max_length", self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_limit_passes() {
        let out = MaxLengthCheck::block(10)
            .check("short", &CheckContext::default())
            .await
            .unwrap();
        assert!(out.passed);
        assert_eq!(out.details["length"], 5);
    }

    #[tokio::test]
    async fn test_over_limit_blocks() {
        let out = MaxLengthCheck::block(10)
            .check("this is far too long", &CheckContext::default())
            .await
            .unwrap();
        assert!(out.blocked);
        assert_eq!(
            out.reason.as_deref(),
            Some("Content length 20 exceeds limit of 10")
        );
    }

    #[tokio::test]
    async fn test_truncate_counts_chars_not_bytes() {
        let out = MaxLengthCheck::truncate(3)
            .check("héllo", &CheckContext::default())
            .await
            .unwrap();
        assert!(out.passed);
        assert_eq!(out.modified_content.as_deref(), Some("hél"));
    }
}
