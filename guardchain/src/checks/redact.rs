//! Regex-driven masking of sensitive spans.

use async_trait::async_trait;
use regex::{NoExpand, Regex};
use serde_json::Value;

use crate::error::{CheckError, ConfigError};
use crate::guardrail::{CheckContext, GuardrailCheck, GuardrailOutput};

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";
const PHONE_PATTERN: &str = r"\+?\d{1,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b";
const CARD_PATTERN: &str = r"\b(?:\d[ -]?){13,16}\b";

/// Default replacement for masked spans.
pub const DEFAULT_MASK: &str = "[REDACTED]";

/// Rewrites content, replacing every match of its rules with a mask.
///
/// Never blocks and never fails: masked content is proposed through
/// `modified_content`, with per-category counts in `details`.
#[derive(Debug, Clone)]
pub struct RedactCheck {
    mask: String,
    rules: Vec<(String, Regex)>,
}

impl Default for RedactCheck {
    fn default() -> Self {
        Self {
            mask: DEFAULT_MASK.to_owned(),
            rules: Vec::new(),
        }
    }
}

impl RedactCheck {
    /// Create an empty redactor with the default mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement text.
    #[must_use]
    pub fn mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }

    /// Add a labelled pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if `pattern` does not compile.
    pub fn rule(mut self, label: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern).map_err(|e| ConfigError::invalid_pattern(pattern, &e))?;
        self.rules.push((label.into(), re));
        Ok(self)
    }

    /// E-mail addresses, phone numbers and card-like digit runs.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-in patterns are valid.
    pub fn pii() -> Result<Self, ConfigError> {
        Self::new()
            .rule("email", EMAIL_PATTERN)?
            .rule("card", CARD_PATTERN)?
            .rule("phone", PHONE_PATTERN)
    }
}

#[async_trait]
impl GuardrailCheck for RedactCheck {
    async fn check(
        &self,
        content: &str,
        _ctx: &CheckContext,
    ) -> Result<GuardrailOutput, CheckError> {
        let mut redacted = content.to_owned();
        let mut counts = serde_json::Map::new();
        let mut total = 0usize;

        for (label, re) in &self.rules {
            let hits = re.find_iter(&redacted).count();
            if hits == 0 {
                continue;
            }
            redacted = re.replace_all(&redacted, NoExpand(self.mask.as_str())).into_owned();
            counts.insert(label.clone(), Value::from(hits));
            total += hits;
        }

        if total == 0 {
            return Ok(GuardrailOutput::pass());
        }
        Ok(GuardrailOutput::modify(redacted)
            .with_reason(format!("Redacted {total} sensitive span(s)"))
            .with_detail("redactions", total)
            .with_detail("categories", Value::Object(counts)))
    }
}
